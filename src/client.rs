use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use crate::data::{load_roster_csv, parse_roster};
use crate::error::{DashboardError, Result};
use crate::model::{Prediction, PredictionRequest, PredictionResponse, StudentRecord};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the upstream student API (`/api/students`, `/api/predict`).
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(DashboardError::Config("api base url is empty".to_string()));
        }
        let http = reqwest::Client::builder()
            .user_agent(concat!("student-dashboard/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn fetch_students(&self) -> Result<Vec<StudentRecord>> {
        let url = format!("{}/api/students", self.base_url);
        debug!(%url, "fetching roster");
        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DashboardError::UpstreamStatus(status.as_u16()));
        }
        let payload: Value = response.json().await?;
        parse_roster(payload)
    }

    pub async fn predict(&self, request: &PredictionRequest) -> Result<Prediction> {
        let url = format!("{}/api/predict", self.base_url);
        debug!(%url, "requesting prediction");
        let response = self.http.post(&url).json(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DashboardError::UpstreamStatus(status.as_u16()));
        }
        let payload: PredictionResponse = response.json().await?;
        payload.into_prediction()
    }
}

/// Where each refresh cycle gets its roster from.
#[derive(Clone)]
pub enum RosterSource {
    Api(ApiClient),
    Csv(PathBuf),
}

impl RosterSource {
    pub async fn fetch(&self) -> Result<Vec<StudentRecord>> {
        match self {
            RosterSource::Api(client) => client.fetch_students().await,
            RosterSource::Csv(path) => {
                let path = path.clone();
                tokio::task::spawn_blocking(move || load_roster_csv(&path))
                    .await
                    .map_err(|err| DashboardError::Io(std::io::Error::other(err)))?
            }
        }
    }

    pub fn describe(&self) -> String {
        match self {
            RosterSource::Api(client) => format!("{}/api/students", client.base_url()),
            RosterSource::Csv(path) => path.display().to_string(),
        }
    }
}
