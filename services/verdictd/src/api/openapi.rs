//! OpenAPI schema aggregation for the decision API.
//!
//! # Purpose
//! Collects all routes and schema types into a single OpenAPI document for
//! docs and client generation.
use crate::api::types::{
    AbacPolicyListResponse, AbacPolicyPayload, AddedResponse, AttributeListResponse,
    AttributeWriteRequest, ConditionPayload, EnforceRequest, EnforceResponse, ErrorResponse,
    HealthStatus, ModelsResponse, PathResponse, PermissionCheckRequest, PermissionCheckResponse,
    PermissionMappingsResponse, PolicyListResponse, PolicyRecord, PolicyRequest,
    RelationshipListResponse, RelationshipPayload, RemovedResponse, RoleListResponse, RoleRequest,
};
use crate::api::{abac, attributes, enforce, policies, relationships, roles, system};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "verdictd",
        version = "v1",
        description = "Multi-model authorization decision service HTTP API"
    ),
    paths(
        system::system_health,
        system::list_models,
        enforce::authorize,
        policies::add_acl_policy,
        policies::list_acl_policies,
        policies::remove_acl_policy,
        policies::add_rbac_policy,
        policies::list_rbac_policies,
        policies::remove_rbac_policy,
        roles::add_user_role,
        roles::get_user_roles,
        roles::delete_user_role,
        attributes::set_user_attributes,
        attributes::get_user_attributes,
        attributes::delete_user_attribute,
        attributes::set_object_attributes,
        attributes::get_object_attributes,
        attributes::delete_object_attribute,
        abac::create_abac_policy,
        abac::list_abac_policies,
        abac::get_abac_policy,
        abac::update_abac_policy,
        abac::delete_abac_policy,
        relationships::add_relationship,
        relationships::list_relationships,
        relationships::remove_relationship,
        relationships::find_relationship_path,
        relationships::get_relationship_permissions,
        relationships::check_relationship_permission
    ),
    components(schemas(
        ErrorResponse,
        HealthStatus,
        ModelsResponse,
        EnforceRequest,
        EnforceResponse,
        PolicyRequest,
        PolicyRecord,
        PolicyListResponse,
        AddedResponse,
        RemovedResponse,
        RoleRequest,
        RoleListResponse,
        AttributeWriteRequest,
        AttributeListResponse,
        ConditionPayload,
        AbacPolicyPayload,
        AbacPolicyListResponse,
        RelationshipPayload,
        RelationshipListResponse,
        PathResponse,
        PermissionMappingsResponse,
        PermissionCheckRequest,
        PermissionCheckResponse
    )),
    tags(
        (name = "system", description = "Health and discovery endpoints"),
        (name = "authorizations", description = "Decision endpoint for all models"),
        (name = "acl", description = "ACL policy management"),
        (name = "rbac", description = "RBAC policy and role management"),
        (name = "abac", description = "ABAC policy and attribute management"),
        (name = "rebac", description = "ReBAC relationship management")
    )
)]
pub struct ApiDoc;
