use thiserror::Error;

pub type Result<T> = std::result::Result<T, DashboardError>;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unexpected roster payload: {0}")]
    Payload(String),
    #[error("upstream returned status {0}")]
    UpstreamStatus(u16),
    #[error("prediction response missing `{0}`")]
    MissingField(&'static str),
    #[error("invalid configuration: {0}")]
    Config(String),
}
