//! Decision service HTTP application wiring.
//!
//! # Purpose
//! Builds the Axum router, configures middleware, and defines the shared
//! application state injected into handlers.
//!
//! # Notes
//! This module centralizes route composition to keep `main` small and
//! testable.
use crate::api;
use crate::api::openapi::ApiDoc;
use crate::observability;
use axum::Router;
use axum::routing::get;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_opentelemetry::OpenTelemetrySpanExt;
use utoipa::OpenApi;
use verdict_engine::AuthorizationService;

#[derive(Clone)]
pub struct AppState {
    pub authz: Arc<AuthorizationService>,
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            let parent = observability::trace_context_from_headers(request.headers());
            let span = tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version()
            );
            span.set_parent(parent);
            span
        });

    Router::new()
        .route("/api/v1/system/health", get(api::system::system_health))
        .route("/api/v1/models", get(api::system::list_models))
        .route(
            "/api/v1/authorizations",
            axum::routing::post(api::enforce::authorize),
        )
        .route(
            "/api/v1/acl/policies",
            get(api::policies::list_acl_policies)
                .post(api::policies::add_acl_policy)
                .delete(api::policies::remove_acl_policy),
        )
        .route(
            "/api/v1/rbac/policies",
            get(api::policies::list_rbac_policies)
                .post(api::policies::add_rbac_policy)
                .delete(api::policies::remove_rbac_policy),
        )
        .route(
            "/api/v1/users/:user/roles",
            get(api::roles::get_user_roles).post(api::roles::add_user_role),
        )
        .route(
            "/api/v1/users/:user/roles/:role",
            axum::routing::delete(api::roles::delete_user_role),
        )
        .route(
            "/api/v1/users/:user/attributes",
            get(api::attributes::get_user_attributes).put(api::attributes::set_user_attributes),
        )
        .route(
            "/api/v1/users/:user/attributes/:key",
            axum::routing::delete(api::attributes::delete_user_attribute),
        )
        .route(
            "/api/v1/objects/:object/attributes",
            get(api::attributes::get_object_attributes)
                .put(api::attributes::set_object_attributes),
        )
        .route(
            "/api/v1/objects/:object/attributes/:key",
            axum::routing::delete(api::attributes::delete_object_attribute),
        )
        .route(
            "/api/v1/abac/policies",
            get(api::abac::list_abac_policies).post(api::abac::create_abac_policy),
        )
        .route(
            "/api/v1/abac/policies/:id",
            get(api::abac::get_abac_policy)
                .put(api::abac::update_abac_policy)
                .delete(api::abac::delete_abac_policy),
        )
        .route(
            "/api/v1/relationships",
            get(api::relationships::list_relationships)
                .post(api::relationships::add_relationship)
                .delete(api::relationships::remove_relationship),
        )
        .route(
            "/api/v1/relationships/paths",
            get(api::relationships::find_relationship_path),
        )
        .route(
            "/api/v1/relationships/permissions",
            get(api::relationships::get_relationship_permissions),
        )
        .route(
            "/api/v1/relationships/permissions/check",
            axum::routing::post(api::relationships::check_relationship_permission),
        )
        .merge(
            utoipa_swagger_ui::SwaggerUi::new("/docs")
                .url("/api/v1/openapi.json", ApiDoc::openapi()),
        )
        .layer(trace_layer)
        .with_state(state)
}
