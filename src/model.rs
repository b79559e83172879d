use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{DashboardError, Result};

/// Roster identifiers arrive as either integers or strings.
#[derive(Debug, Serialize, Clone, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum StudentId {
    Int(i64),
    Text(String),
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StudentId::Int(id) => write!(f, "{}", id),
            StudentId::Text(id) => f.write_str(id),
        }
    }
}

/// Weekly study time, either as the ordinal code (1..=3) or as a range label like "2-5h".
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum StudyTime {
    Code(i64),
    Label(String),
}

impl StudyTime {
    pub fn bucket(&self) -> Option<StudyBucket> {
        match self {
            StudyTime::Code(1) => Some(StudyBucket::OneToTwo),
            StudyTime::Code(2) => Some(StudyBucket::TwoToFive),
            StudyTime::Code(3) => Some(StudyBucket::FiveToTen),
            StudyTime::Code(_) => None,
            StudyTime::Label(label) if label.contains("1-2") => Some(StudyBucket::OneToTwo),
            StudyTime::Label(label) if label.contains("2-5") => Some(StudyBucket::TwoToFive),
            StudyTime::Label(label) if label.contains("5-10") => Some(StudyBucket::FiveToTen),
            StudyTime::Label(_) => None,
        }
    }
}

impl fmt::Display for StudyTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StudyTime::Code(code) => write!(f, "{}", code),
            StudyTime::Label(label) => f.write_str(label),
        }
    }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StudyBucket {
    OneToTwo,
    TwoToFive,
    FiveToTen,
}

impl StudyBucket {
    pub const ALL: [StudyBucket; 3] = [
        StudyBucket::OneToTwo,
        StudyBucket::TwoToFive,
        StudyBucket::FiveToTen,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            StudyBucket::OneToTwo => "1-2h",
            StudyBucket::TwoToFive => "2-5h",
            StudyBucket::FiveToTen => "5-10h",
        }
    }
}

/// One roster row. Every field is optional: a missing, null or mistyped value
/// decodes to `None` so a single bad field never rejects the whole record.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct StudentRecord {
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: Option<StudentId>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub school: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub age: Option<u32>,
    #[serde(default, deserialize_with = "lenient::study")]
    pub study: Option<StudyTime>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub failures: Option<u32>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub absences: Option<u32>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub g1: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub g2: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub g3: Option<f64>,
}

// Prediction structures
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PredictionRequest {
    pub age: f64,
    pub study: f64,
    pub g1: f64,
    pub g2: f64,
    pub failures: f64,
    pub absences: f64,
}

/// Upstream prediction payload as received; both fields must be present to display it.
#[derive(Debug, Deserialize, Clone)]
pub struct PredictionResponse {
    #[serde(default, deserialize_with = "lenient::number")]
    pub predicted_grade: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub status: Option<String>,
}

impl PredictionResponse {
    pub fn into_prediction(self) -> Result<Prediction> {
        let predicted_grade = self
            .predicted_grade
            .ok_or(DashboardError::MissingField("predicted_grade"))?;
        let status = self.status.ok_or(DashboardError::MissingField("status"))?;
        Ok(Prediction {
            predicted_grade,
            status,
        })
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Prediction {
    pub predicted_grade: f64,
    pub status: String,
}

impl Prediction {
    pub fn display(&self) -> String {
        format!("{} ({}/20)", self.status, self.predicted_grade)
    }
}

mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::{StudentId, StudyTime};

    pub fn number<'de, D: Deserializer<'de>>(de: D) -> Result<Option<f64>, D::Error> {
        let value = Value::deserialize(de)?;
        Ok(as_number(&value))
    }

    pub fn count<'de, D: Deserializer<'de>>(de: D) -> Result<Option<u32>, D::Error> {
        let value = Value::deserialize(de)?;
        Ok(as_number(&value)
            .filter(|v| *v >= 0.0 && v.fract() == 0.0 && *v <= u32::MAX as f64)
            .map(|v| v as u32))
    }

    pub fn text<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
        let value = Value::deserialize(de)?;
        Ok(match value {
            Value::String(s) if !s.is_empty() => Some(s),
            _ => None,
        })
    }

    pub fn id<'de, D: Deserializer<'de>>(de: D) -> Result<Option<StudentId>, D::Error> {
        let value = Value::deserialize(de)?;
        Ok(match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|v| v.fract() == 0.0).map(|v| v as i64))
                .map(StudentId::Int),
            Value::String(s) if !s.is_empty() => Some(StudentId::Text(s)),
            _ => None,
        })
    }

    pub fn study<'de, D: Deserializer<'de>>(de: D) -> Result<Option<StudyTime>, D::Error> {
        let value = Value::deserialize(de)?;
        Ok(match value {
            Value::Number(n) => n.as_i64().map(StudyTime::Code),
            Value::String(s) if !s.is_empty() => Some(match s.trim().parse::<i64>() {
                Ok(code) => StudyTime::Code(code),
                Err(_) => StudyTime::Label(s),
            }),
            _ => None,
        })
    }

    fn as_number(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|v| v.is_finite())
    }
}
