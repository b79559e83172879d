use serde::Serialize;

use crate::model::StudentRecord;
use crate::status::PASS_THRESHOLD;

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Default)]
pub struct Summary {
    pub total: usize,
    pub avg_grade: f64,
    /// Percentage of graded students with `g3 >= 10`.
    pub success_rate: f64,
    pub avg_age: f64,
}

/// Summary figures as the dashboard cards show them.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct SummaryDisplay {
    pub total: String,
    pub avg_grade: String,
    pub success_rate: String,
    pub avg_age: String,
}

impl Summary {
    pub fn display(&self) -> SummaryDisplay {
        if self.total == 0 {
            return SummaryDisplay {
                total: "0".to_string(),
                avg_grade: "0".to_string(),
                success_rate: "0%".to_string(),
                avg_age: "0".to_string(),
            };
        }
        SummaryDisplay {
            total: self.total.to_string(),
            avg_grade: format!("{:.1}", self.avg_grade),
            success_rate: format!("{:.1}%", self.success_rate),
            avg_age: format!("{:.1}", self.avg_age),
        }
    }
}

/// Statistics over the whole roster. Missing values are left out of the
/// mean they would feed; an empty input yields all zeros.
pub fn summarize(records: &[StudentRecord]) -> Summary {
    let total = records.len();
    if total == 0 {
        return Summary::default();
    }

    let grades: Vec<f64> = records.iter().filter_map(|r| r.g3).collect();
    let passed = grades.iter().filter(|&&g| g >= PASS_THRESHOLD).count();
    let success_rate = if grades.is_empty() {
        0.0
    } else {
        passed as f64 / grades.len() as f64 * 100.0
    };

    Summary {
        total,
        avg_grade: round1(mean(grades.iter().copied())),
        success_rate: round1(success_rate),
        avg_age: round1(mean(records.iter().filter_map(|r| r.age.map(f64::from)))),
    }
}

/// Arithmetic mean, 0 when nothing contributes.
pub(crate) fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count > 0 {
        sum / count as f64
    } else {
        0.0
    }
}

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
