//! HTTP API request/response types.
//!
//! # Purpose
//! Defines the wire payload shapes for the decision REST API and OpenAPI
//! schema generation. Field names (`type`, `logic_op`, `created_at`,
//! `updated_at`) are part of the compatibility contract with existing
//! clients.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use utoipa::ToSchema;
use verdict_engine::model::{AbacPolicy, PolicyCondition, PolicyTriple, Relationship};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ModelsResponse {
    pub models: Vec<String>,
    pub default_model: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct EnforceRequest {
    /// One of `acl`, `rbac`, `abac`, `rebac`; empty selects the default.
    #[serde(default)]
    pub model: String,
    pub subject: String,
    pub object: String,
    pub action: String,
    /// Request-scoped attribute overrides, consulted by ABAC only.
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct EnforceResponse {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub model: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct PolicyRequest {
    pub subject: String,
    pub object: String,
    pub action: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct PolicyRecord {
    pub subject: String,
    pub object: String,
    pub action: String,
}

impl From<PolicyTriple> for PolicyRecord {
    fn from(triple: PolicyTriple) -> Self {
        Self {
            subject: triple.subject,
            object: triple.object,
            action: triple.action,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PolicyListResponse {
    pub policies: Vec<PolicyRecord>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AddedResponse {
    pub added: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RemovedResponse {
    pub removed: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct RoleRequest {
    pub role: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RoleListResponse {
    pub user: String,
    pub roles: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct AttributeWriteRequest {
    pub attributes: HashMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AttributeListResponse {
    pub attributes: HashMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct ConditionPayload {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub field: String,
    pub operator: String,
    pub value: String,
    #[serde(default)]
    pub logic_op: String,
}

impl From<PolicyCondition> for ConditionPayload {
    fn from(condition: PolicyCondition) -> Self {
        Self {
            condition_type: condition.condition_type,
            field: condition.field,
            operator: condition.operator,
            value: condition.value,
            logic_op: condition.logic_op,
        }
    }
}

impl From<ConditionPayload> for PolicyCondition {
    fn from(payload: ConditionPayload) -> Self {
        Self {
            condition_type: payload.condition_type,
            field: payload.field,
            operator: payload.operator,
            value: payload.value,
            logic_op: payload.logic_op,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct AbacPolicyPayload {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub effect: String,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub conditions: Vec<ConditionPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<AbacPolicy> for AbacPolicyPayload {
    fn from(policy: AbacPolicy) -> Self {
        Self {
            id: policy.id,
            name: policy.name,
            description: policy.description,
            effect: policy.effect,
            priority: policy.priority,
            conditions: policy.conditions.into_iter().map(Into::into).collect(),
            created_at: Some(policy.created_at),
            updated_at: Some(policy.updated_at),
        }
    }
}

impl From<AbacPolicyPayload> for AbacPolicy {
    fn from(payload: AbacPolicyPayload) -> Self {
        // Timestamps are stamped by the engine; payload values are
        // placeholders for the write path.
        let fallback = Utc::now();
        Self {
            id: payload.id,
            name: payload.name,
            description: payload.description,
            effect: payload.effect,
            priority: payload.priority,
            conditions: payload.conditions.into_iter().map(Into::into).collect(),
            created_at: payload.created_at.unwrap_or(fallback),
            updated_at: payload.updated_at.unwrap_or(fallback),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AbacPolicyListResponse {
    pub policies: Vec<AbacPolicyPayload>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct RelationshipPayload {
    pub subject: String,
    pub relationship: String,
    pub object: String,
}

impl From<Relationship> for RelationshipPayload {
    fn from(relationship: Relationship) -> Self {
        Self {
            subject: relationship.subject,
            relationship: relationship.relationship,
            object: relationship.object,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RelationshipListResponse {
    pub relationships: Vec<RelationshipPayload>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PathQuery {
    pub subject: Option<String>,
    pub object: Option<String>,
    pub max_depth: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RelationshipQuery {
    pub subject: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PathResponse {
    pub found: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
    pub subject: String,
    pub object: String,
    pub max_depth: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PermissionMappingsResponse {
    /// Sorted for stable output.
    pub mappings: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct PermissionCheckRequest {
    pub relationship: String,
    pub permission: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PermissionCheckResponse {
    pub relationship: String,
    pub permission: String,
    pub granted: bool,
    pub all_permissions: Vec<String>,
}
