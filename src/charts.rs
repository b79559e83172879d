use serde::Serialize;
use std::collections::BTreeMap;

use crate::analytics::{mean, round1};
use crate::model::{StudentRecord, StudyBucket};

/// Illustrative study-time series, used when the grouped averages are not wanted.
pub const STUDY_PLACEHOLDER: [f64; 3] = [12.0, 13.5, 14.5];

// Chart data structures
#[derive(Debug, Serialize, Clone, PartialEq, Default)]
pub struct Series {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl Series {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    fn push(&mut self, label: impl Into<String>, value: f64) {
        self.labels.push(label.into());
        self.values.push(value);
    }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum ChartDataset {
    Series(Series),
    Points(Vec<ScatterPoint>),
}

impl ChartDataset {
    pub fn is_empty(&self) -> bool {
        match self {
            ChartDataset::Series(series) => series.is_empty(),
            ChartDataset::Points(points) => points.is_empty(),
        }
    }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Final,
    Gender,
    Study,
    Failures,
    Progression,
    Absence,
}

impl ChartKind {
    pub const ALL: [ChartKind; 6] = [
        ChartKind::Final,
        ChartKind::Gender,
        ChartKind::Study,
        ChartKind::Failures,
        ChartKind::Progression,
        ChartKind::Absence,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ChartKind::Final => "final",
            ChartKind::Gender => "gender",
            ChartKind::Study => "study",
            ChartKind::Failures => "failures",
            ChartKind::Progression => "progression",
            ChartKind::Absence => "absence",
        }
    }

    /// Canvas element the page draws this chart into.
    pub fn element_id(&self) -> String {
        format!("chart-{}", self.name())
    }
}

/// Every dataset the dashboard draws, rebuilt in full on each refresh.
#[derive(Debug, Serialize, Clone, PartialEq, Default)]
pub struct ChartBundle {
    #[serde(rename = "final")]
    pub final_grades: Series,
    pub gender: Series,
    pub study: Series,
    pub failures: Series,
    pub progression: Series,
    pub absence: Vec<ScatterPoint>,
}

impl ChartBundle {
    pub fn is_empty(&self) -> bool {
        ChartKind::ALL
            .iter()
            .all(|kind| self.dataset(*kind).is_empty())
    }

    pub fn dataset(&self, kind: ChartKind) -> ChartDataset {
        match kind {
            ChartKind::Final => ChartDataset::Series(self.final_grades.clone()),
            ChartKind::Gender => ChartDataset::Series(self.gender.clone()),
            ChartKind::Study => ChartDataset::Series(self.study.clone()),
            ChartKind::Failures => ChartDataset::Series(self.failures.clone()),
            ChartKind::Progression => ChartDataset::Series(self.progression.clone()),
            ChartKind::Absence => ChartDataset::Points(self.absence.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StudyChartMode {
    /// Average final grade per study-time bucket.
    #[default]
    Grouped,
    /// Fixed illustrative series.
    Placeholder,
}

pub struct ChartBuilder {
    study_mode: StudyChartMode,
}

impl ChartBuilder {
    pub fn new(study_mode: StudyChartMode) -> Self {
        ChartBuilder { study_mode }
    }

    pub fn build(&self, records: &[StudentRecord]) -> ChartBundle {
        if records.is_empty() {
            return ChartBundle::default();
        }
        ChartBundle {
            final_grades: self.final_grades(records),
            gender: self.gender(records),
            study: self.study(records),
            failures: self.failures(records),
            progression: self.progression(records),
            absence: self.absence(records),
        }
    }

    // Histogram of exact final grades, ascending
    fn final_grades(&self, records: &[StudentRecord]) -> Series {
        let mut grades: Vec<f64> = records.iter().filter_map(|r| r.g3).collect();
        grades.sort_by(f64::total_cmp);

        let mut bins: Vec<(f64, usize)> = Vec::new();
        for grade in grades {
            match bins.last_mut() {
                Some((value, count)) if *value == grade => *count += 1,
                _ => bins.push((grade, 1)),
            }
        }

        let mut series = Series::default();
        for (grade, count) in bins {
            series.push(grade.to_string(), count as f64);
        }
        series
    }

    fn gender(&self, records: &[StudentRecord]) -> Series {
        let count = |code: &str| {
            records
                .iter()
                .filter(|r| r.gender.as_deref() == Some(code))
                .count() as f64
        };
        let mut series = Series::default();
        series.push("Male", count("M"));
        series.push("Female", count("F"));
        series
    }

    fn study(&self, records: &[StudentRecord]) -> Series {
        let mut series = Series::default();
        for (idx, bucket) in StudyBucket::ALL.iter().enumerate() {
            let value = match self.study_mode {
                StudyChartMode::Placeholder => STUDY_PLACEHOLDER[idx],
                StudyChartMode::Grouped => round1(mean(
                    records
                        .iter()
                        .filter(|r| r.study.as_ref().and_then(|s| s.bucket()) == Some(*bucket))
                        .filter_map(|r| r.g3),
                )),
            };
            series.push(bucket.label(), value);
        }
        series
    }

    // Failure counts, numerically ordered
    fn failures(&self, records: &[StudentRecord]) -> Series {
        let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
        for failures in records.iter().filter_map(|r| r.failures) {
            *counts.entry(failures).or_insert(0) += 1;
        }

        let mut series = Series::default();
        for (failures, count) in counts {
            series.push(format!("Failures: {}", failures), count as f64);
        }
        series
    }

    fn progression(&self, records: &[StudentRecord]) -> Series {
        let mut series = Series::default();
        series.push("G1", mean(records.iter().filter_map(|r| r.g1)));
        series.push("G2", mean(records.iter().filter_map(|r| r.g2)));
        series.push("G3", mean(records.iter().filter_map(|r| r.g3)));
        series
    }

    fn absence(&self, records: &[StudentRecord]) -> Vec<ScatterPoint> {
        records
            .iter()
            .filter_map(|r| match (r.absences, r.g3) {
                (Some(absences), Some(g3)) => Some(ScatterPoint {
                    x: f64::from(absences),
                    y: g3,
                }),
                _ => None,
            })
            .collect()
    }
}

impl Default for ChartBuilder {
    fn default() -> Self {
        ChartBuilder::new(StudyChartMode::default())
    }
}
