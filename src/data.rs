use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim, Writer};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt::Display;
use std::path::Path;
use tracing::warn;

use crate::error::{DashboardError, Result};
use crate::model::StudentRecord;
use crate::status::classify;

pub const EXPORT_HEADERS: [&str; 11] = [
    "ID",
    "School",
    "Gender",
    "Age",
    "Study Time",
    "Failures",
    "Absences",
    "G1",
    "G2",
    "G3",
    "Status",
];

/// Decodes the `/api/students` payload. Entries that are not objects are skipped
/// with a warning; the rest of the roster still loads.
pub fn parse_roster(payload: Value) -> Result<Vec<StudentRecord>> {
    let items = match payload {
        Value::Array(items) => items,
        other => {
            return Err(DashboardError::Payload(format!(
                "expected a JSON array of students, got {}",
                json_kind(&other)
            )))
        }
    };

    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        if !item.is_object() {
            warn!(index, kind = json_kind(&item), "skipping non-object roster entry");
            continue;
        }
        match serde_json::from_value::<StudentRecord>(item) {
            Ok(record) => records.push(record),
            Err(err) => warn!(index, error = %err, "skipping malformed roster entry"),
        }
    }

    Ok(dedupe_ids(records))
}

/// Loads a roster from a CSV file with an
/// `id,school,gender,age,study,failures,absences,g1,g2,g3` header.
pub fn load_roster_csv(path: &Path) -> Result<Vec<StudentRecord>> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)?;
    let headers = rdr.headers()?.clone();

    let mut records = Vec::new();
    for (index, result) in rdr.records().enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(err) => {
                warn!(row = index + 1, error = %err, "skipping unreadable csv row");
                continue;
            }
        };
        match serde_json::from_value::<StudentRecord>(csv_row_object(&headers, &row)) {
            Ok(record) => records.push(record),
            Err(err) => warn!(row = index + 1, error = %err, "skipping malformed csv row"),
        }
    }

    Ok(dedupe_ids(records))
}

/// Every cell stays text so `101` or `true` keep their spelling. Only an id written
/// as a plain integer is read as a number, matching ids from the JSON roster.
fn csv_row_object(headers: &StringRecord, row: &StringRecord) -> Value {
    let fields: Map<String, Value> = headers
        .iter()
        .zip(row.iter())
        .map(|(name, cell)| {
            let value = match cell.parse::<i64>() {
                Ok(id) if name == "id" && id.to_string() == cell => Value::from(id),
                _ => Value::from(cell),
            };
            (name.to_string(), value)
        })
        .collect();
    Value::Object(fields)
}

/// Keeps the first record for each id. Records without an id are kept.
pub fn dedupe_ids(records: Vec<StudentRecord>) -> Vec<StudentRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| match &record.id {
            Some(id) if !seen.insert(id.clone()) => {
                warn!(%id, "dropping duplicate student id");
                false
            }
            _ => true,
        })
        .collect()
}

/// Table rows as CSV, in the order given.
pub fn export_csv(rows: &[&StudentRecord]) -> Result<Vec<u8>> {
    let mut wtr = Writer::from_writer(Vec::new());
    wtr.write_record(EXPORT_HEADERS)?;

    for record in rows {
        let status = record.g3.map(|g3| classify(g3).text).unwrap_or("");
        wtr.write_record([
            cell(&record.id),
            cell(&record.school),
            cell(&record.gender),
            cell(&record.age),
            cell(&record.study),
            cell(&record.failures),
            cell(&record.absences),
            cell(&record.g1),
            cell(&record.g2),
            cell(&record.g3),
            status.to_string(),
        ])?;
    }

    wtr.into_inner()
        .map_err(|err| DashboardError::Io(err.into_error()))
}

pub fn export_filename(date: NaiveDate) -> String {
    format!("student_performance_{}.csv", date.format("%Y%m%d"))
}

fn cell<T: Display>(value: &Option<T>) -> String {
    value.as_ref().map(|v| v.to_string()).unwrap_or_default()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
