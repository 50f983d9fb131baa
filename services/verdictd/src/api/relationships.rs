//! ReBAC relationship and permission-mapping endpoints.
use crate::api::error::{ApiError, api_validation_error};
use crate::api::rebac_engine;
use crate::api::types::{
    PathQuery, PathResponse, PermissionCheckRequest, PermissionCheckResponse,
    PermissionMappingsResponse, RelationshipListResponse, RelationshipPayload, RelationshipQuery,
};
use crate::app::AppState;
use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

#[utoipa::path(
    post,
    path = "/api/v1/relationships",
    tag = "rebac",
    request_body = RelationshipPayload,
    responses(
        (status = 201, description = "Relationship added", body = RelationshipPayload)
    )
)]
pub(crate) async fn add_relationship(
    State(state): State<AppState>,
    Json(body): Json<RelationshipPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let engine = rebac_engine(&state)?;
    engine
        .add_relationship(&body.subject, &body.relationship, &body.object)
        .await?;
    Ok((StatusCode::CREATED, Json(body)))
}

#[utoipa::path(
    get,
    path = "/api/v1/relationships",
    tag = "rebac",
    params(
        ("subject" = Option<String>, Query, description = "Filter by subject; omit for all")
    ),
    responses(
        (status = 200, description = "Forward relationships", body = RelationshipListResponse)
    )
)]
pub(crate) async fn list_relationships(
    Query(query): Query<RelationshipQuery>,
    State(state): State<AppState>,
) -> Result<Json<RelationshipListResponse>, ApiError> {
    let engine = rebac_engine(&state)?;
    let subject = query.subject.unwrap_or_default();
    let relationships = engine
        .relationships(&subject)
        .await
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(RelationshipListResponse { relationships }))
}

// Removal is silent on absent edges, mirroring the engine contract.
#[utoipa::path(
    delete,
    path = "/api/v1/relationships",
    tag = "rebac",
    request_body = RelationshipPayload,
    responses(
        (status = 204, description = "Relationship removed (or was absent)")
    )
)]
pub(crate) async fn remove_relationship(
    State(state): State<AppState>,
    Json(body): Json<RelationshipPayload>,
) -> Result<StatusCode, ApiError> {
    let engine = rebac_engine(&state)?;
    engine
        .remove_relationship(&body.subject, &body.relationship, &body.object)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// Connectivity probe, not an authorization check; use /authorizations for
// permission decisions.
#[utoipa::path(
    get,
    path = "/api/v1/relationships/paths",
    tag = "rebac",
    params(
        ("subject" = String, Query, description = "Start node"),
        ("object" = String, Query, description = "Target node"),
        ("max_depth" = Option<i32>, Query, description = "Search depth; non-positive selects the default")
    ),
    responses(
        (status = 200, description = "Path search outcome", body = PathResponse),
        (status = 400, description = "Missing parameters", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn find_relationship_path(
    Query(query): Query<PathQuery>,
    State(state): State<AppState>,
) -> Result<Json<PathResponse>, ApiError> {
    let engine = rebac_engine(&state)?;
    let (Some(subject), Some(object)) = (query.subject, query.object) else {
        return Err(api_validation_error(
            "subject and object parameters are required",
        ));
    };
    let max_depth = query.max_depth.unwrap_or(5);
    let (found, path) = engine.find_path(&subject, &object, max_depth).await;
    Ok(Json(PathResponse {
        found,
        path,
        subject,
        object,
        max_depth,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/relationships/permissions",
    tag = "rebac",
    responses(
        (status = 200, description = "Relationship-to-permission mappings", body = PermissionMappingsResponse)
    )
)]
pub(crate) async fn get_relationship_permissions(
    State(state): State<AppState>,
) -> Result<Json<PermissionMappingsResponse>, ApiError> {
    let engine = rebac_engine(&state)?;
    let mappings = engine.relationship_permissions().into_iter().collect();
    Ok(Json(PermissionMappingsResponse { mappings }))
}

#[utoipa::path(
    post,
    path = "/api/v1/relationships/permissions/check",
    tag = "rebac",
    request_body = PermissionCheckRequest,
    responses(
        (status = 200, description = "Permission check outcome", body = PermissionCheckResponse),
        (status = 400, description = "Missing fields", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn check_relationship_permission(
    State(state): State<AppState>,
    Json(body): Json<PermissionCheckRequest>,
) -> Result<Json<PermissionCheckResponse>, ApiError> {
    let engine = rebac_engine(&state)?;
    if body.relationship.is_empty() || body.permission.is_empty() {
        return Err(api_validation_error(
            "relationship and permission fields are required",
        ));
    }
    let granted = engine.check_relationship_permission(&body.relationship, &body.permission);
    let all_permissions = engine.permissions_for_relationship(&body.relationship);
    Ok(Json(PermissionCheckResponse {
        relationship: body.relationship,
        permission: body.permission,
        granted,
        all_permissions,
    }))
}
