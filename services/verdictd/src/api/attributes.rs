//! User and object attribute endpoints backing the ABAC engine.
//!
//! Writes pass straight through to the attribute repository; a failure
//! midway through a multi-attribute write is not rolled back and the
//! caller may retry the whole request.
use crate::api::abac_engine;
use crate::api::error::{ApiError, api_validation_error};
use crate::api::types::{AttributeListResponse, AttributeWriteRequest};
use crate::app::AppState;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

#[utoipa::path(
    put,
    path = "/api/v1/users/{user}/attributes",
    tag = "abac",
    params(
        ("user" = String, Path, description = "User identifier")
    ),
    request_body = AttributeWriteRequest,
    responses(
        (status = 204, description = "Attributes stored"),
        (status = 400, description = "Empty attribute set", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn set_user_attributes(
    Path(user): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<AttributeWriteRequest>,
) -> Result<StatusCode, ApiError> {
    if body.attributes.is_empty() {
        return Err(api_validation_error("at least one attribute is required"));
    }
    let engine = abac_engine(&state)?;
    engine.set_user_attributes(&user, &body.attributes).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{user}/attributes",
    tag = "abac",
    params(
        ("user" = String, Path, description = "User identifier")
    ),
    responses(
        (status = 200, description = "Attributes for the user", body = AttributeListResponse)
    )
)]
pub(crate) async fn get_user_attributes(
    Path(user): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<AttributeListResponse>, ApiError> {
    let engine = abac_engine(&state)?;
    let attributes = engine.user_attributes(&user).await?;
    Ok(Json(AttributeListResponse { attributes }))
}

#[utoipa::path(
    delete,
    path = "/api/v1/users/{user}/attributes/{key}",
    tag = "abac",
    params(
        ("user" = String, Path, description = "User identifier"),
        ("key" = String, Path, description = "Attribute name")
    ),
    responses(
        (status = 204, description = "Attribute removed"),
        (status = 404, description = "Attribute not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn delete_user_attribute(
    Path((user, key)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let engine = abac_engine(&state)?;
    engine.remove_user_attribute(&user, &key).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/api/v1/objects/{object}/attributes",
    tag = "abac",
    params(
        ("object" = String, Path, description = "Object identifier")
    ),
    request_body = AttributeWriteRequest,
    responses(
        (status = 204, description = "Attributes stored"),
        (status = 400, description = "Empty attribute set", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn set_object_attributes(
    Path(object): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<AttributeWriteRequest>,
) -> Result<StatusCode, ApiError> {
    if body.attributes.is_empty() {
        return Err(api_validation_error("at least one attribute is required"));
    }
    let engine = abac_engine(&state)?;
    engine
        .set_object_attributes(&object, &body.attributes)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/objects/{object}/attributes",
    tag = "abac",
    params(
        ("object" = String, Path, description = "Object identifier")
    ),
    responses(
        (status = 200, description = "Attributes for the object", body = AttributeListResponse)
    )
)]
pub(crate) async fn get_object_attributes(
    Path(object): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<AttributeListResponse>, ApiError> {
    let engine = abac_engine(&state)?;
    let attributes = engine.object_attributes(&object).await?;
    Ok(Json(AttributeListResponse { attributes }))
}

#[utoipa::path(
    delete,
    path = "/api/v1/objects/{object}/attributes/{key}",
    tag = "abac",
    params(
        ("object" = String, Path, description = "Object identifier"),
        ("key" = String, Path, description = "Attribute name")
    ),
    responses(
        (status = 204, description = "Attribute removed"),
        (status = 404, description = "Attribute not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn delete_object_attribute(
    Path((object, key)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let engine = abac_engine(&state)?;
    engine.remove_object_attribute(&object, &key).await?;
    Ok(StatusCode::NO_CONTENT)
}
