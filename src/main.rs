use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use student_dashboard::charts::ChartBuilder;
use student_dashboard::config::Config;
use student_dashboard::refresh::RefreshController;
use student_dashboard::render::ChartCanvas;
use student_dashboard::server::{start_server, AppState};
use student_dashboard::state::DashboardSnapshot;

#[actix_web::main]
async fn main() -> Result<(), Box<dyn Error>> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::parse();
    config.validate()?;

    let client = config.api_client()?;
    let source = config.roster_source(&client);
    info!(source = %source.describe(), study_chart = ?config.study_chart, "roster source configured");

    let canvas = Arc::new(ChartCanvas::new());
    let (publisher, snapshots) = watch::channel(Arc::new(DashboardSnapshot::empty()));
    let controller = RefreshController::new(
        source,
        ChartBuilder::new(config.study_mode()),
        Arc::clone(&canvas),
        publisher,
    );
    let refresher = tokio::spawn(controller.run(config.refresh_interval()));

    info!(
        "Starting Student Dashboard on http://{}:{}",
        config.bind, config.port
    );
    let state = AppState {
        snapshots,
        canvas,
        client,
    };
    let served = start_server(state, &config.bind, config.port).await;

    refresher.abort();
    served?;
    Ok(())
}
