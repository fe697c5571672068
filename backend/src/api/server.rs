//! HTTP Server for the dashboard API.
//!
//! Read-only JSON endpoints, one per panel. The frontend owns rendering.
//!
//! # API Endpoints
//!
//! | Method | Path               | Description                          |
//! |--------|--------------------|--------------------------------------|
//! | GET    | `/health`          | Health check                         |
//! | GET    | `/api/coverage`    | Treatment coverage trend + top N     |
//! | GET    | `/api/burden`      | Incidence / mortality trend          |
//! | GET    | `/api/reduction`   | Reduction choropleth                 |
//! | GET    | `/api/resistance`  | RR-TB heatmap                        |
//! | GET    | `/api/coinfection` | Developed vs Developing co-infection |
//! | GET    | `/api/comparison`  | RR-TB share vs burden rate           |
//! | GET    | `/api/countries`   | Coverage country selector            |
//! | GET    | `/api/logs`        | SSE stream for real-time logs        |

use axum::{
    extract::{Query, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, Json, Sse},
    routing::get,
    Router,
};
use futures::stream::Stream;
use serde::Deserialize;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_error, LOG_BROADCASTER};
use super::types::{error_response, status_for, PanelResponse};
use crate::error::{PipelineError, ServerResult};
use crate::transform::panels::{
    BurdenPanel, BurdenRequest, CoinfectionPanel, CoinfectionRequest, ComparisonPanel, CoveragePanel,
    CoverageRequest, ReductionPanel, ReductionRequest, ResistancePanel, ResistanceRequest,
};
use crate::transform::Dashboard;

/// Shared application state
pub type AppState = Arc<Dashboard>;

type ApiError = (StatusCode, Json<Value>);
type ApiResult<P> = Result<Json<PanelResponse<P>>, ApiError>;

/// Build the router. Split from [`start_server`] so tests can drive it.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/coverage", get(coverage))
        .route("/api/burden", get(burden))
        .route("/api/reduction", get(reduction))
        .route("/api/resistance", get(resistance))
        .route("/api/coinfection", get(coinfection))
        .route("/api/comparison", get(comparison))
        .route("/api/countries", get(countries))
        .route("/api/logs", get(sse_logs))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(dashboard: Dashboard, port: u16) -> ServerResult<()> {
    let data_dir = dashboard.config().data_dir.display().to_string();
    let app = router(Arc::new(dashboard));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 TB dashboard server running on http://localhost:{}", port);
    println!("   Data directory: {}", data_dir);
    println!("   GET  /api/coverage    /api/burden      /api/reduction");
    println!("   GET  /api/resistance  /api/coinfection /api/comparison");
    println!("   GET  /api/countries   /api/logs (SSE)  /health");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "tbdash",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

fn reject(error: PipelineError) -> ApiError {
    log_error(error.to_string());
    (status_for(&error), Json(error_response(&error.to_string())))
}

async fn coverage(State(dash): State<AppState>, Query(req): Query<CoverageRequest>) -> ApiResult<CoveragePanel> {
    dash.coverage(&req).map(|p| Json(p.into())).map_err(reject)
}

async fn burden(State(dash): State<AppState>, Query(req): Query<BurdenRequest>) -> ApiResult<BurdenPanel> {
    dash.burden(&req).map(|p| Json(p.into())).map_err(reject)
}

async fn reduction(State(dash): State<AppState>, Query(req): Query<ReductionRequest>) -> ApiResult<ReductionPanel> {
    dash.reduction(&req).map(|p| Json(p.into())).map_err(reject)
}

/// Resistance query string: `regions` is a comma-separated list.
#[derive(Debug, Default, Deserialize)]
struct ResistanceQuery {
    regions: Option<String>,
    from: Option<i32>,
    to: Option<i32>,
}

impl From<ResistanceQuery> for ResistanceRequest {
    fn from(q: ResistanceQuery) -> Self {
        ResistanceRequest {
            regions: q.regions.map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            }),
            from: q.from,
            to: q.to,
        }
    }
}

async fn resistance(
    State(dash): State<AppState>,
    Query(query): Query<ResistanceQuery>,
) -> ApiResult<ResistancePanel> {
    dash.resistance(&query.into()).map(|p| Json(p.into())).map_err(reject)
}

async fn coinfection(
    State(dash): State<AppState>,
    Query(req): Query<CoinfectionRequest>,
) -> ApiResult<CoinfectionPanel> {
    dash.coinfection(&req).map(|p| Json(p.into())).map_err(reject)
}

async fn comparison(State(dash): State<AppState>) -> Json<PanelResponse<ComparisonPanel>> {
    Json(dash.comparison().into())
}

async fn countries(State(dash): State<AppState>) -> Result<Json<Value>, ApiError> {
    let countries = dash.countries().map_err(reject)?;
    Ok(Json(json!({ "countries": countries })))
}
