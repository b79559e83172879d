use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

use crate::charts::StudyChartMode;
use crate::client::{ApiClient, RosterSource};
use crate::error::{DashboardError, Result};

#[derive(Debug, Clone, Parser)]
#[command(name = "student-dashboard")]
#[command(about = "Student performance dashboard: roster statistics, charts and grade predictions", long_about = None)]
pub struct Config {
    /// Base URL of the student API serving /api/students and /api/predict
    #[arg(long, env = "DASHBOARD_API_BASE", default_value = "http://127.0.0.1:5000")]
    pub api_base: String,

    /// Address the dashboard listens on
    #[arg(long, env = "DASHBOARD_BIND", default_value = "127.0.0.1")]
    pub bind: String,

    #[arg(long, env = "DASHBOARD_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Seconds between roster refreshes
    #[arg(long, env = "DASHBOARD_REFRESH_SECS", default_value_t = 30)]
    pub refresh_secs: u64,

    /// Read the roster from a CSV file instead of the API
    #[arg(long, env = "DASHBOARD_ROSTER_CSV")]
    pub roster_csv: Option<PathBuf>,

    /// How the study-time chart is filled
    #[arg(long, value_enum, default_value_t = StudyChartArg::Grouped)]
    pub study_chart: StudyChartArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StudyChartArg {
    /// Average final grade per study-time bucket
    Grouped,
    /// Fixed illustrative series
    Placeholder,
}

impl From<StudyChartArg> for StudyChartMode {
    fn from(arg: StudyChartArg) -> Self {
        match arg {
            StudyChartArg::Grouped => StudyChartMode::Grouped,
            StudyChartArg::Placeholder => StudyChartMode::Placeholder,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.refresh_secs == 0 {
            return Err(DashboardError::Config(
                "--refresh-secs must be at least 1".to_string(),
            ));
        }
        if self.bind.trim().is_empty() {
            return Err(DashboardError::Config("--bind must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs.max(1))
    }

    pub fn study_mode(&self) -> StudyChartMode {
        self.study_chart.into()
    }

    pub fn api_client(&self) -> Result<ApiClient> {
        ApiClient::new(self.api_base.clone())
    }

    pub fn roster_source(&self, client: &ApiClient) -> RosterSource {
        match &self.roster_csv {
            Some(path) => RosterSource::Csv(path.clone()),
            None => RosterSource::Api(client.clone()),
        }
    }
}
