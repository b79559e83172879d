use serde_json::json;

use student_dashboard::data::parse_roster;
use student_dashboard::{
    classify, filter_records, summarize, ChartBuilder, ScatterPoint, StudentId, StudentRecord,
};

fn roster() -> Vec<StudentRecord> {
    parse_roster(json!([
        {"id": 1, "school": "GP", "gender": "F", "age": 18, "study": "2-5h",
         "failures": 0, "absences": 6, "g1": 5, "g2": 6, "g3": 6},
        {"id": 2, "school": "GP", "gender": "F", "age": 17, "study": "1-2h",
         "failures": 0, "absences": 4, "g1": 5, "g2": 5, "g3": 6},
        {"id": 3, "school": "MS", "gender": "M", "age": 15, "study": "2-5h",
         "failures": 3, "absences": 10, "g1": 7, "g2": 8, "g3": 10},
        {"id": 4, "school": "MS", "gender": "M", "age": 15, "study": "5-10h",
         "failures": 0, "absences": 2, "g1": 15, "g2": 14, "g3": 15},
        {"id": 5, "school": "GP", "gender": "U", "age": 16, "study": "2-5h",
         "failures": 1, "absences": 0, "g1": 6, "g2": 10, "g3": 10}
    ]))
    .unwrap()
}

#[test]
fn status_boundaries() {
    assert_eq!(classify(15.0).text, "Excellent");
    assert_eq!(classify(10.0).text, "Good");
    assert_eq!(classify(9.999).text, "Average");
}

#[test]
fn summary_uses_whole_roster() {
    let records = roster();
    let summary = summarize(&records);
    assert_eq!(summary.total, 5);
    assert_eq!(summary.avg_grade, 9.4);
    assert_eq!(summary.success_rate, 60.0);
    assert_eq!(summary.avg_age, 16.2);

    let display = summary.display();
    assert_eq!(display.total, "5");
    assert_eq!(display.avg_grade, "9.4");
    assert_eq!(display.success_rate, "60.0%");
    assert_eq!(display.avg_age, "16.2");
}

#[test]
fn search_filters_table_rows_only() {
    let records = roster();
    let rows = filter_records(&records, "GP");
    let ids: Vec<Option<StudentId>> = rows.iter().map(|r| r.id.clone()).collect();
    assert_eq!(
        ids,
        vec![
            Some(StudentId::Int(1)),
            Some(StudentId::Int(2)),
            Some(StudentId::Int(5))
        ]
    );
    assert_eq!(summarize(&records).total, 5);
    assert_eq!(filter_records(&records, "").len(), records.len());
}

#[test]
fn chart_bundle_from_roster() {
    let records = roster();
    let bundle = ChartBuilder::default().build(&records);

    assert_eq!(bundle.final_grades.labels, vec!["6", "10", "15"]);
    assert_eq!(bundle.final_grades.values, vec![2.0, 2.0, 1.0]);

    assert_eq!(bundle.gender.labels, vec!["Male", "Female"]);
    assert_eq!(bundle.gender.values, vec![2.0, 2.0]);

    assert_eq!(bundle.study.labels, vec!["1-2h", "2-5h", "5-10h"]);
    assert_eq!(bundle.study.values, vec![6.0, 8.7, 15.0]);

    assert_eq!(
        bundle.failures.labels,
        vec!["Failures: 0", "Failures: 1", "Failures: 3"]
    );
    assert_eq!(bundle.failures.values, vec![3.0, 1.0, 1.0]);

    assert_eq!(bundle.progression.labels, vec!["G1", "G2", "G3"]);
    assert_eq!(bundle.progression.values, vec![7.6, 8.6, 9.4]);

    assert_eq!(bundle.absence.len(), records.len());
    assert_eq!(bundle.absence[0], ScatterPoint { x: 6.0, y: 6.0 });
    assert_eq!(bundle.absence[4], ScatterPoint { x: 0.0, y: 10.0 });
}

#[test]
fn malformed_record_does_not_abort_pipeline() {
    let records = parse_roster(json!([
        {"id": 1, "school": "GP", "gender": "M", "age": 16, "absences": 1, "g3": 12},
        {"id": 2, "school": null, "gender": null, "age": "old", "absences": -1, "g3": "??"},
        42
    ]))
    .unwrap();
    assert_eq!(records.len(), 2);

    let summary = summarize(&records);
    assert_eq!(summary.total, 2);
    assert_eq!(summary.avg_grade, 12.0);
    assert_eq!(summary.avg_age, 16.0);

    let bundle = ChartBuilder::default().build(&records);
    assert_eq!(bundle.final_grades.values, vec![1.0]);
    assert_eq!(bundle.absence, vec![ScatterPoint { x: 1.0, y: 12.0 }]);
    assert_eq!(filter_records(&records, "gp").len(), 1);
}
