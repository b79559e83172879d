use crate::model::StudentRecord;

/// Records whose id, school or gender contains `query`, case-insensitively.
/// An empty query keeps everything. Input order is preserved.
pub fn filter_records<'a>(records: &'a [StudentRecord], query: &str) -> Vec<&'a StudentRecord> {
    if query.is_empty() {
        return records.iter().collect();
    }
    let needle = query.to_lowercase();
    records
        .iter()
        .filter(|record| matches_query(record, &needle))
        .collect()
}

fn matches_query(record: &StudentRecord, needle: &str) -> bool {
    let id = record
        .id
        .as_ref()
        .map(|id| id.to_string())
        .unwrap_or_default();
    let school = record.school.as_deref().unwrap_or("");
    let gender = record.gender.as_deref().unwrap_or("");

    [id.as_str(), school, gender]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}
