use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::analytics::{summarize, Summary, SummaryDisplay};
use crate::charts::{ChartBuilder, ChartBundle};
use crate::filter::filter_records;
use crate::model::StudentRecord;
use crate::status::{classify, StatusLabel};

pub const ERROR_INDICATOR: &str = "Error";

/// Everything the dashboard carries from one refresh to the next.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// Current roster; replaced as a whole, never edited.
    pub records: Arc<[StudentRecord]>,
    /// Count of successful loads so far.
    pub generation: u64,
    pub refreshed_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            records: Arc::from(Vec::new()),
            generation: 0,
            refreshed_at: None,
            last_error: None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    Loaded {
        records: Vec<StudentRecord>,
        at: DateTime<Utc>,
    },
    Failed {
        error: String,
    },
}

impl DashboardState {
    /// Next state after a fetch. A failure keeps the previous roster.
    pub fn apply(self, outcome: RefreshOutcome) -> DashboardState {
        match outcome {
            RefreshOutcome::Loaded { records, at } => DashboardState {
                records: records.into(),
                generation: self.generation + 1,
                refreshed_at: Some(at),
                last_error: None,
            },
            RefreshOutcome::Failed { error } => DashboardState {
                last_error: Some(error),
                ..self
            },
        }
    }

    pub fn is_failed(&self) -> bool {
        self.last_error.is_some()
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct TableRow {
    #[serde(flatten)]
    pub record: StudentRecord,
    pub status: Option<StatusLabel>,
}

impl From<&StudentRecord> for TableRow {
    fn from(record: &StudentRecord) -> Self {
        TableRow {
            record: record.clone(),
            status: record.g3.map(classify),
        }
    }
}

/// Immutable view handed to the HTTP layer after each refresh.
#[derive(Debug, Serialize, Clone)]
pub struct DashboardSnapshot {
    pub generation: u64,
    pub refreshed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub summary: Summary,
    pub display: SummaryDisplay,
    pub charts: ChartBundle,
    #[serde(skip)]
    pub records: Arc<[StudentRecord]>,
}

impl DashboardSnapshot {
    pub fn build(state: &DashboardState, builder: &ChartBuilder) -> Self {
        let summary = summarize(&state.records);
        let mut display = summary.display();
        if state.is_failed() {
            display.total = ERROR_INDICATOR.to_string();
        }

        DashboardSnapshot {
            generation: state.generation,
            refreshed_at: state.refreshed_at,
            error: state.last_error.clone(),
            summary,
            display,
            charts: builder.build(&state.records),
            records: Arc::clone(&state.records),
        }
    }

    pub fn empty() -> Self {
        Self::build(&DashboardState::default(), &ChartBuilder::default())
    }

    pub fn matching(&self, query: &str) -> Vec<&StudentRecord> {
        filter_records(&self.records, query)
    }

    pub fn table(&self, query: &str) -> Vec<TableRow> {
        self.matching(query).into_iter().map(TableRow::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StudentId;

    fn record(id: i64, school: &str, g3: f64) -> StudentRecord {
        StudentRecord {
            id: Some(StudentId::Int(id)),
            school: Some(school.to_string()),
            g3: Some(g3),
            ..Default::default()
        }
    }

    #[test]
    fn loaded_roster_replaces_previous() {
        let state = DashboardState::default().apply(RefreshOutcome::Loaded {
            records: vec![record(1, "GP", 12.0)],
            at: Utc::now(),
        });
        let state = state.apply(RefreshOutcome::Loaded {
            records: vec![record(2, "MS", 8.0), record(3, "MS", 18.0)],
            at: Utc::now(),
        });
        assert_eq!(state.generation, 2);
        assert_eq!(state.records.len(), 2);
        assert_eq!(state.records[0].id, Some(StudentId::Int(2)));
        assert!(!state.is_failed());
    }

    #[test]
    fn failure_keeps_last_roster() {
        let state = DashboardState::default().apply(RefreshOutcome::Loaded {
            records: vec![record(1, "GP", 12.0)],
            at: Utc::now(),
        });
        let refreshed_at = state.refreshed_at;
        let state = state.apply(RefreshOutcome::Failed {
            error: "connection refused".to_string(),
        });
        assert_eq!(state.generation, 1);
        assert_eq!(state.records.len(), 1);
        assert_eq!(state.refreshed_at, refreshed_at);
        assert_eq!(state.last_error.as_deref(), Some("connection refused"));
    }

    #[test]
    fn snapshot_shows_error_indicator_after_failure() {
        let state = DashboardState::default()
            .apply(RefreshOutcome::Loaded {
                records: vec![record(1, "GP", 10.0), record(2, "GP", 20.0)],
                at: Utc::now(),
            })
            .apply(RefreshOutcome::Failed {
                error: "timeout".to_string(),
            });
        let snapshot = DashboardSnapshot::build(&state, &ChartBuilder::default());
        assert_eq!(snapshot.display.total, ERROR_INDICATOR);
        assert_eq!(snapshot.display.avg_grade, "15.0");
        assert_eq!(snapshot.summary.total, 2);
    }

    #[test]
    fn table_is_filtered_but_summary_is_not() {
        let state = DashboardState::default().apply(RefreshOutcome::Loaded {
            records: vec![record(1, "GP", 16.0), record(2, "MS", 9.0)],
            at: Utc::now(),
        });
        let snapshot = DashboardSnapshot::build(&state, &ChartBuilder::default());

        let rows = snapshot.table("gp");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status.as_ref().map(|s| s.text), Some("Excellent"));
        assert_eq!(snapshot.summary.total, 2);
        assert_eq!(snapshot.summary.success_rate, 50.0);
    }

    #[test]
    fn empty_snapshot_has_no_charts() {
        let snapshot = DashboardSnapshot::empty();
        assert_eq!(snapshot.generation, 0);
        assert!(snapshot.charts.is_empty());
        assert!(snapshot.table("").is_empty());
    }
}
