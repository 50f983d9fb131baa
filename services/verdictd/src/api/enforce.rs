//! The decision endpoint.
//!
//! # Purpose
//! Accepts a `(model, subject, object, action, attributes)` tuple, routes
//! it through the dispatcher, and maps the decision onto HTTP: an allow is
//! 200, a deny is 403, both with the same response body shape.
use crate::api::error::ApiError;
use crate::api::types::{EnforceRequest, EnforceResponse};
use crate::app::AppState;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use verdict_engine::AuthorizationService;

#[utoipa::path(
    post,
    path = "/api/v1/authorizations",
    tag = "authorizations",
    request_body = EnforceRequest,
    responses(
        (status = 200, description = "Access granted", body = EnforceResponse),
        (status = 403, description = "Access denied", body = EnforceResponse),
        (status = 400, description = "Unknown model", body = crate::api::types::ErrorResponse),
        (status = 503, description = "Model not configured", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn authorize(
    State(state): State<AppState>,
    Json(body): Json<EnforceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let model = AuthorizationService::resolve_model(&body.model)?;
    let decision = state
        .authz
        .enforce(
            model.as_str(),
            &body.subject,
            &body.object,
            &body.action,
            &body.attributes,
        )
        .await?;

    let outcome = if decision.allowed { "allow" } else { "deny" };
    metrics::counter!(
        "verdict_decisions_total",
        "model" => model.as_str(),
        "outcome" => outcome
    )
    .increment(1);
    tracing::debug!(
        model = %model,
        subject = %body.subject,
        object = %body.object,
        action = %body.action,
        allowed = decision.allowed,
        "authorization decision"
    );

    let status = if decision.allowed {
        StatusCode::OK
    } else {
        StatusCode::FORBIDDEN
    };
    let message = if decision.allowed {
        "access granted"
    } else {
        "access denied"
    };
    Ok((
        status,
        Json(EnforceResponse {
            allowed: decision.allowed,
            message: Some(message.to_string()),
            model: model.to_string(),
            path: decision.path,
        }),
    ))
}
