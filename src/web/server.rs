//! Axum ingestion server.
//!
//! Two routes: `GET /version` for liveness probes and `POST /log`
//! accepting one run or an array of runs. The body is re-validated
//! record by record before anything reaches the warehouse, so a
//! malformed entry rejects the whole request with `400` and no
//! partial write.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::HttpSettings;
use crate::error::StoreError;
use crate::record::Run;
use crate::store::Warehouse;

/// Application state shared across handlers.
pub struct AppState {
    pub warehouse: Warehouse,
}

/// Build the axum router with all routes.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/version", get(version))
        .route("/log", post(log_runs))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bind the listener and serve until the process exits.
pub async fn serve(http: &HttpSettings, warehouse: Warehouse) -> std::io::Result<()> {
    let state = Arc::new(AppState { warehouse });
    let app = router(state);

    let address = format!("{}:{}", http.host, http.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("listening on http://{address}");
    axum::serve(listener, app).await
}

#[derive(Serialize)]
struct VersionResponse {
    version: &'static str,
}

/// GET /version
async fn version() -> Json<VersionResponse> {
    Json(VersionResponse {
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// POST /log - ingest one run or an array of runs.
async fn log_runs(
    State(state): State<Arc<AppState>>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let runs = match parse_runs(body) {
        Ok(runs) => runs,
        Err(e) => return e.into_response(),
    };

    match state.warehouse.insert_runs(&runs).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to ingest {} run(s)", runs.len());
            e.into_response()
        }
    }
}

/// Defensive parsing: the body may be a single run or an array, and
/// every entry is validated individually.
fn parse_runs(body: serde_json::Value) -> Result<Vec<Run>, StoreError> {
    let entries = match body {
        serde_json::Value::Array(entries) => entries,
        single => vec![single],
    };
    entries
        .into_iter()
        .map(|entry| {
            serde_json::from_value::<Run>(entry).map_err(|e| StoreError::Validation(e.to_string()))
        })
        .collect()
}
