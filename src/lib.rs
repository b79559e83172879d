//! Student performance dashboard.
//!
//! Periodically fetches a student roster, derives summary statistics and chart
//! datasets from it, and serves them over HTTP together with a searchable table
//! and a grade-prediction proxy.

pub mod analytics;
pub mod charts;
pub mod client;
pub mod config;
pub mod data;
pub mod error;
pub mod filter;
pub mod model;
pub mod refresh;
pub mod render;
pub mod server;
pub mod state;
pub mod status;

pub use analytics::{summarize, Summary, SummaryDisplay};
pub use charts::{ChartBuilder, ChartBundle, ChartKind, ScatterPoint, Series, StudyChartMode};
pub use error::{DashboardError, Result};
pub use filter::filter_records;
pub use model::{StudentId, StudentRecord, StudyTime};
pub use state::{DashboardSnapshot, DashboardState, RefreshOutcome};
pub use status::{classify, Status, StatusLabel};
