use serde::Serialize;

pub const EXCELLENT_THRESHOLD: f64 = 15.0;
pub const PASS_THRESHOLD: f64 = 10.0;

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Excellent,
    Good,
    Average,
}

impl Status {
    pub fn text(&self) -> &'static str {
        match self {
            Status::Excellent => "Excellent",
            Status::Good => "Good",
            Status::Average => "Average",
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            Status::Excellent => "status-excellent",
            Status::Good => "status-good",
            Status::Average => "status-average",
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct StatusLabel {
    pub text: &'static str,
    pub class: &'static str,
}

impl From<Status> for StatusLabel {
    fn from(status: Status) -> Self {
        StatusLabel {
            text: status.text(),
            class: status.css_class(),
        }
    }
}

/// Qualitative label for a final grade. Lower bounds are inclusive.
pub fn classify(g3: f64) -> StatusLabel {
    status_of(g3).into()
}

pub fn status_of(g3: f64) -> Status {
    if g3 >= EXCELLENT_THRESHOLD {
        Status::Excellent
    } else if g3 >= PASS_THRESHOLD {
        Status::Good
    } else {
        Status::Average
    }
}
