//! ABAC policy management endpoints.
use crate::api::abac_engine;
use crate::api::error::ApiError;
use crate::api::types::{AbacPolicyListResponse, AbacPolicyPayload};
use crate::app::AppState;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use verdict_engine::model::AbacPolicy;

#[utoipa::path(
    post,
    path = "/api/v1/abac/policies",
    tag = "abac",
    request_body = AbacPolicyPayload,
    responses(
        (status = 201, description = "Policy created", body = AbacPolicyPayload),
        (status = 400, description = "Malformed policy", body = crate::api::types::ErrorResponse),
        (status = 409, description = "Policy id already exists", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn create_abac_policy(
    State(state): State<AppState>,
    Json(body): Json<AbacPolicyPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let engine = abac_engine(&state)?;
    let created = engine.add_policy(AbacPolicy::from(body)).await?;
    Ok((
        StatusCode::CREATED,
        Json(AbacPolicyPayload::from(created)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/abac/policies",
    tag = "abac",
    responses(
        (status = 200, description = "List ABAC policies", body = AbacPolicyListResponse)
    )
)]
pub(crate) async fn list_abac_policies(
    State(state): State<AppState>,
) -> Result<Json<AbacPolicyListResponse>, ApiError> {
    let engine = abac_engine(&state)?;
    let policies = engine.policies().await.into_iter().map(Into::into).collect();
    Ok(Json(AbacPolicyListResponse { policies }))
}

#[utoipa::path(
    get,
    path = "/api/v1/abac/policies/{id}",
    tag = "abac",
    params(
        ("id" = String, Path, description = "Policy identifier")
    ),
    responses(
        (status = 200, description = "Fetch policy", body = AbacPolicyPayload),
        (status = 404, description = "Policy not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn get_abac_policy(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<AbacPolicyPayload>, ApiError> {
    let engine = abac_engine(&state)?;
    let policy = engine.policy(&id).await?;
    Ok(Json(AbacPolicyPayload::from(policy)))
}

// The path id wins over any id carried in the body, so a policy cannot be
// renamed onto another record by mistake.
#[utoipa::path(
    put,
    path = "/api/v1/abac/policies/{id}",
    tag = "abac",
    params(
        ("id" = String, Path, description = "Policy identifier")
    ),
    request_body = AbacPolicyPayload,
    responses(
        (status = 200, description = "Policy updated", body = AbacPolicyPayload),
        (status = 400, description = "Malformed policy", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Policy not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn update_abac_policy(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<AbacPolicyPayload>,
) -> Result<Json<AbacPolicyPayload>, ApiError> {
    let engine = abac_engine(&state)?;
    let mut policy = AbacPolicy::from(body);
    policy.id = id;
    let updated = engine.update_policy(policy).await?;
    Ok(Json(AbacPolicyPayload::from(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/abac/policies/{id}",
    tag = "abac",
    params(
        ("id" = String, Path, description = "Policy identifier")
    ),
    responses(
        (status = 204, description = "Policy removed"),
        (status = 404, description = "Policy not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn delete_abac_policy(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let engine = abac_engine(&state)?;
    engine.remove_policy(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
