//! RBAC role assignment endpoints.
use crate::api::error::ApiError;
use crate::api::rbac_engine;
use crate::api::types::{AddedResponse, RemovedResponse, RoleListResponse, RoleRequest};
use crate::app::AppState;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

#[utoipa::path(
    post,
    path = "/api/v1/users/{user}/roles",
    tag = "rbac",
    params(
        ("user" = String, Path, description = "User identifier")
    ),
    request_body = RoleRequest,
    responses(
        (status = 201, description = "Role assigned", body = AddedResponse),
        (status = 200, description = "Role already assigned", body = AddedResponse)
    )
)]
pub(crate) async fn add_user_role(
    Path(user): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<RoleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let engine = rbac_engine(&state)?;
    let added = engine.add_role_for_user(&user, &body.role).await?;
    let status = if added {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(AddedResponse { added })))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{user}/roles",
    tag = "rbac",
    params(
        ("user" = String, Path, description = "User identifier")
    ),
    responses(
        (status = 200, description = "Roles assigned to the user", body = RoleListResponse)
    )
)]
pub(crate) async fn get_user_roles(
    Path(user): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<RoleListResponse>, ApiError> {
    let engine = rbac_engine(&state)?;
    let roles = engine.roles_for_user(&user).await;
    Ok(Json(RoleListResponse { user, roles }))
}

#[utoipa::path(
    delete,
    path = "/api/v1/users/{user}/roles/{role}",
    tag = "rbac",
    params(
        ("user" = String, Path, description = "User identifier"),
        ("role" = String, Path, description = "Role identifier")
    ),
    responses(
        (status = 200, description = "Removal outcome", body = RemovedResponse)
    )
)]
pub(crate) async fn delete_user_role(
    Path((user, role)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<RemovedResponse>, ApiError> {
    let engine = rbac_engine(&state)?;
    let removed = engine.remove_role_for_user(&user, &role).await?;
    Ok(Json(RemovedResponse { removed }))
}
