//! Domain model shared by the decision engines.
//!
//! # Purpose
//! Defines the record shapes persisted by the repositories and evaluated by
//! the engines. Wire-facing field names (`type`, `logic_op`, `created_at`,
//! `updated_at`) are fixed for compatibility with existing clients.
use crate::error::{EngineError, EngineResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const EFFECT_ALLOW: &str = "allow";
pub const EFFECT_DENY: &str = "deny";

pub const LOGIC_AND: &str = "and";
pub const LOGIC_OR: &str = "or";

/// Access-control model selecting which engine evaluates a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessModel {
    Acl,
    Rbac,
    Abac,
    Rebac,
}

impl AccessModel {
    pub fn as_str(self) -> &'static str {
        match self {
            AccessModel::Acl => "acl",
            AccessModel::Rbac => "rbac",
            AccessModel::Abac => "abac",
            AccessModel::Rebac => "rebac",
        }
    }
}

impl std::fmt::Display for AccessModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccessModel {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "acl" => Ok(AccessModel::Acl),
            "rbac" => Ok(AccessModel::Rbac),
            "abac" => Ok(AccessModel::Abac),
            "rebac" => Ok(AccessModel::Rebac),
            _ => Err(()),
        }
    }
}

/// A `(subject, object, action)` policy record used by the ACL and RBAC
/// engines. Policy sets have set semantics: duplicates collapse and
/// insertion order does not affect evaluation.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct PolicyTriple {
    pub subject: String,
    pub object: String,
    pub action: String,
}

impl PolicyTriple {
    pub fn new(
        subject: impl Into<String>,
        object: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            object: object.into(),
            action: action.into(),
        }
    }
}

/// A flat user-to-role edge. Roles are terminal principals: assigning a
/// role to a user does not imply role-to-role inheritance.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct RoleAssignment {
    pub user: String,
    pub role: String,
}

impl RoleAssignment {
    pub fn new(user: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            role: role.into(),
        }
    }
}

/// An attribute-based policy evaluated by the ABAC engine.
///
/// Policies are arbitrated in descending `priority` order; the first policy
/// whose condition sequence matches decides the request via `effect`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbacPolicy {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub effect: String,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub conditions: Vec<PolicyCondition>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AbacPolicy {
    /// Checks the structural invariants before a policy is accepted.
    pub fn validate(&self) -> EngineResult<()> {
        if self.id.is_empty() {
            return Err(EngineError::InvalidInput(
                "policy id cannot be empty".to_string(),
            ));
        }
        if self.name.is_empty() {
            return Err(EngineError::InvalidInput(
                "policy name cannot be empty".to_string(),
            ));
        }
        if self.effect != EFFECT_ALLOW && self.effect != EFFECT_DENY {
            return Err(EngineError::InvalidInput(format!(
                "policy effect must be '{EFFECT_ALLOW}' or '{EFFECT_DENY}'"
            )));
        }
        for (index, condition) in self.conditions.iter().enumerate() {
            if condition.condition_type.is_empty()
                || condition.field.is_empty()
                || condition.operator.is_empty()
                || condition.value.is_empty()
            {
                return Err(EngineError::InvalidInput(format!(
                    "condition {index}: type, field, operator, and value cannot be empty"
                )));
            }
            if !condition.logic_op.is_empty()
                && condition.logic_op != LOGIC_AND
                && condition.logic_op != LOGIC_OR
            {
                return Err(EngineError::InvalidInput(format!(
                    "condition {index}: logic_op must be '{LOGIC_AND}', '{LOGIC_OR}', or empty"
                )));
            }
        }
        Ok(())
    }
}

/// One comparison inside an ABAC policy. `logic_op` combines this
/// condition's result with the next one; the last condition's `logic_op`
/// has no effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyCondition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub field: String,
    pub operator: String,
    pub value: String,
    #[serde(default)]
    pub logic_op: String,
}

/// A directed labeled edge in the ReBAC relationship graph.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Relationship {
    pub subject: String,
    pub relationship: String,
    pub object: String,
}

impl Relationship {
    pub fn new(
        subject: impl Into<String>,
        relationship: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            relationship: relationship.into(),
            object: object.into(),
        }
    }
}

/// Outcome of a dispatched decision request. `path` is the human-readable
/// reachability chain for ReBAC decisions and empty for every other model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    pub path: String,
}

impl Decision {
    pub fn deny() -> Self {
        Self {
            allowed: false,
            path: String::new(),
        }
    }
}
