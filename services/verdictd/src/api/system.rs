//! System and discovery endpoints.
use crate::api::types::{HealthStatus, ModelsResponse};
use crate::app::AppState;
use axum::Json;
use axum::extract::State;
use verdict_engine::service::DEFAULT_MODEL;

#[utoipa::path(
    get,
    path = "/api/v1/system/health",
    tag = "system",
    responses(
        (status = 200, description = "Service health", body = HealthStatus)
    )
)]
pub(crate) async fn system_health(State(_state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        service: "verdictd".to_string(),
    })
}

// Capability discovery: which models this instance can decide, and which
// one an empty selector falls back to.
#[utoipa::path(
    get,
    path = "/api/v1/models",
    tag = "system",
    responses(
        (status = 200, description = "Supported access-control models", body = ModelsResponse)
    )
)]
pub(crate) async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        models: state
            .authz
            .enabled_models()
            .into_iter()
            .map(|model| model.to_string())
            .collect(),
        default_model: DEFAULT_MODEL.to_string(),
    })
}
