use actix_web::http::header;
use actix_web::{web, App, HttpResponse, HttpServer};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::client::ApiClient;
use crate::data::{export_csv, export_filename};
use crate::model::PredictionRequest;
use crate::render::ChartCanvas;
use crate::state::{DashboardSnapshot, TableRow};

pub const PREDICTION_FAILED: &str = "Prediction failed";

const HOMEPAGE: &str = include_str!("homepage.html");

#[derive(Clone)]
pub struct AppState {
    pub snapshots: watch::Receiver<Arc<DashboardSnapshot>>,
    pub canvas: Arc<ChartCanvas>,
    pub client: ApiClient,
}

impl AppState {
    pub fn snapshot(&self) -> Arc<DashboardSnapshot> {
        Arc::clone(&self.snapshots.borrow())
    }
}

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    q: String,
}

#[derive(Serialize)]
struct StudentsResponse {
    total: usize,
    matched: usize,
    rows: Vec<TableRow>,
}

#[derive(Serialize)]
struct PredictionView {
    predicted_grade: f64,
    status: String,
    display: String,
}

// Snapshot endpoint: summary cards and chart datasets
async fn get_dashboard(state: web::Data<AppState>) -> HttpResponse {
    let snapshot = state.snapshot();
    HttpResponse::Ok().json(snapshot.as_ref())
}

// Table endpoint, filtered by the search box
async fn get_students(state: web::Data<AppState>, query: web::Query<SearchQuery>) -> HttpResponse {
    let snapshot = state.snapshot();
    let rows = snapshot.table(&query.q);
    HttpResponse::Ok().json(StudentsResponse {
        total: snapshot.records.len(),
        matched: rows.len(),
        rows,
    })
}

async fn get_charts(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.canvas.charts().as_slice())
}

async fn export_students(
    state: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> HttpResponse {
    let snapshot = state.snapshot();
    let rows = snapshot.matching(&query.q);
    match export_csv(&rows) {
        Ok(body) => {
            let filename = export_filename(Utc::now().date_naive());
            info!(rows = rows.len(), %filename, "exporting students");
            HttpResponse::Ok()
                .content_type("text/csv; charset=utf-8")
                .insert_header((
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename={}", filename),
                ))
                .body(body)
        }
        Err(err) => {
            error!(error = %err, "export failed");
            HttpResponse::InternalServerError().json(json!({ "error": "Export failed" }))
        }
    }
}

// Prediction endpoint, forwarded to the upstream model
async fn predict(
    state: web::Data<AppState>,
    req: web::Json<PredictionRequest>,
) -> HttpResponse {
    match state.client.predict(&req).await {
        Ok(prediction) => HttpResponse::Ok().json(PredictionView {
            display: prediction.display(),
            predicted_grade: prediction.predicted_grade,
            status: prediction.status,
        }),
        Err(err) => {
            warn!(error = %err, "prediction request failed");
            HttpResponse::BadGateway().json(json!({ "error": PREDICTION_FAILED }))
        }
    }
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().body("Student Dashboard is running!")
}

async fn serve_homepage() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(HOMEPAGE)
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(serve_homepage))
        .route("/health", web::get().to(health_check))
        .route("/api/dashboard", web::get().to(get_dashboard))
        .route("/api/students", web::get().to(get_students))
        .route("/api/charts", web::get().to(get_charts))
        .route("/api/export", web::get().to(export_students))
        .route("/api/predict", web::post().to(predict));
}

pub async fn start_server(state: AppState, bind: &str, port: u16) -> std::io::Result<()> {
    let data = web::Data::new(state);

    HttpServer::new(move || App::new().app_data(data.clone()).configure(configure))
        .bind((bind, port))?
        .run()
        .await
}
