//! ACL and RBAC policy management endpoints.
//!
//! Both models share the triple shape; re-adding an existing triple is not
//! an error, it reports `added: false` with a 200.
use crate::api::error::ApiError;
use crate::api::types::{AddedResponse, PolicyListResponse, PolicyRequest, RemovedResponse};
use crate::api::{acl_engine, rbac_engine};
use crate::app::AppState;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;

#[utoipa::path(
    post,
    path = "/api/v1/acl/policies",
    tag = "acl",
    request_body = PolicyRequest,
    responses(
        (status = 201, description = "Policy added", body = AddedResponse),
        (status = 200, description = "Policy already present", body = AddedResponse)
    )
)]
pub(crate) async fn add_acl_policy(
    State(state): State<AppState>,
    Json(body): Json<PolicyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let engine = acl_engine(&state)?;
    let added = engine
        .add_policy(&body.subject, &body.object, &body.action)
        .await?;
    let status = if added {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(AddedResponse { added })))
}

#[utoipa::path(
    get,
    path = "/api/v1/acl/policies",
    tag = "acl",
    responses(
        (status = 200, description = "List ACL policies", body = PolicyListResponse)
    )
)]
pub(crate) async fn list_acl_policies(
    State(state): State<AppState>,
) -> Result<Json<PolicyListResponse>, ApiError> {
    let engine = acl_engine(&state)?;
    let policies = engine.policies().await.into_iter().map(Into::into).collect();
    Ok(Json(PolicyListResponse { policies }))
}

#[utoipa::path(
    delete,
    path = "/api/v1/acl/policies",
    tag = "acl",
    request_body = PolicyRequest,
    responses(
        (status = 200, description = "Removal outcome", body = RemovedResponse)
    )
)]
pub(crate) async fn remove_acl_policy(
    State(state): State<AppState>,
    Json(body): Json<PolicyRequest>,
) -> Result<Json<RemovedResponse>, ApiError> {
    let engine = acl_engine(&state)?;
    let removed = engine
        .remove_policy(&body.subject, &body.object, &body.action)
        .await?;
    Ok(Json(RemovedResponse { removed }))
}

#[utoipa::path(
    post,
    path = "/api/v1/rbac/policies",
    tag = "rbac",
    request_body = PolicyRequest,
    responses(
        (status = 201, description = "Policy added", body = AddedResponse),
        (status = 200, description = "Policy already present", body = AddedResponse)
    )
)]
pub(crate) async fn add_rbac_policy(
    State(state): State<AppState>,
    Json(body): Json<PolicyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let engine = rbac_engine(&state)?;
    let added = engine
        .add_policy(&body.subject, &body.object, &body.action)
        .await?;
    let status = if added {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(AddedResponse { added })))
}

#[utoipa::path(
    get,
    path = "/api/v1/rbac/policies",
    tag = "rbac",
    responses(
        (status = 200, description = "List RBAC policies", body = PolicyListResponse)
    )
)]
pub(crate) async fn list_rbac_policies(
    State(state): State<AppState>,
) -> Result<Json<PolicyListResponse>, ApiError> {
    let engine = rbac_engine(&state)?;
    let policies = engine.policies().await.into_iter().map(Into::into).collect();
    Ok(Json(PolicyListResponse { policies }))
}

#[utoipa::path(
    delete,
    path = "/api/v1/rbac/policies",
    tag = "rbac",
    request_body = PolicyRequest,
    responses(
        (status = 200, description = "Removal outcome", body = RemovedResponse)
    )
)]
pub(crate) async fn remove_rbac_policy(
    State(state): State<AppState>,
    Json(body): Json<PolicyRequest>,
) -> Result<Json<RemovedResponse>, ApiError> {
    let engine = rbac_engine(&state)?;
    let removed = engine
        .remove_policy(&body.subject, &body.object, &body.action)
        .await?;
    Ok(Json(RemovedResponse { removed }))
}
