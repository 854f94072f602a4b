//! Read-only HTTP surface over the snapshot cache

use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::Utc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::auth_middleware::require_metrics_token;
use crate::error::IndexerError;
use crate::metrics;
use crate::state::AppState;
use crate::types::{
    DaosView, ErrorResponse, HealthResponse, ProjectsView, ProposalsView, VaultsView,
};

/// Snapshot that could not be produced, mapped to a 502
pub struct ApiError(IndexerError);

impl From<IndexerError> for ApiError {
    fn from(e: IndexerError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!("Serving 502: {}", self.0);
        (
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

pub fn router(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/health", get(health_check))
        .route("/snapshot", get(get_snapshot))
        .route("/projects", get(get_projects))
        .route("/daos", get(get_daos))
        .route("/governance", get(get_governance))
        .route("/savings", get(get_savings));

    if state.metrics_token.is_some() {
        let admin = Router::new()
            .route("/admin/stats", get(admin_stats))
            .route_layer(middleware::from_fn_with_state(
                state.clone(),
                require_metrics_token,
            ));
        app = app.merge(admin);
    }

    app.fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        timestamp: Utc::now(),
    })
}

async fn get_snapshot(State(state): State<AppState>) -> Result<Response, ApiError> {
    let snapshot = state.cache.get().await?;
    Ok(Json(snapshot.as_ref()).into_response())
}

async fn get_projects(State(state): State<AppState>) -> Result<Response, ApiError> {
    let snapshot = state.cache.get().await?;
    Ok(Json(ProjectsView {
        projects: &snapshot.projects,
        metrics: &snapshot.metrics,
    })
    .into_response())
}

async fn get_daos(State(state): State<AppState>) -> Result<Response, ApiError> {
    let snapshot = state.cache.get().await?;
    Ok(Json(DaosView {
        daos: &snapshot.daos,
    })
    .into_response())
}

async fn get_governance(State(state): State<AppState>) -> Result<Response, ApiError> {
    let snapshot = state.cache.get().await?;
    Ok(Json(ProposalsView {
        proposals: &snapshot.proposals,
    })
    .into_response())
}

async fn get_savings(State(state): State<AppState>) -> Result<Response, ApiError> {
    let snapshot = state.cache.get().await?;
    Ok(Json(VaultsView {
        vaults: &snapshot.vaults,
    })
    .into_response())
}

async fn admin_stats(State(state): State<AppState>) -> Json<serde_json::Value> {
    info!("GET /admin/stats");
    let db_path = state
        .cache
        .store()
        .map(|store| store.location().display_path());
    Json(metrics::snapshot_as_json(db_path.as_deref()))
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not found")
}
