//! Persistence contracts consumed by the decision engines.
//!
//! # Purpose
//! One repository per engine. Implementations back the engines' in-memory
//! caches: `load_*` replays the full record set at bootstrap, the mutation
//! methods are invoked write-through before the corresponding cache update.
//!
//! # Notes
//! Backends may suspend on I/O; pure cache reads inside the engines never
//! call these traits. A backend is free to deduplicate records the engines
//! would also deduplicate (first write wins).
use crate::error::EngineResult;
use crate::model::{AbacPolicy, PolicyTriple, Relationship, RoleAssignment};
use async_trait::async_trait;
use std::collections::HashMap;

/// Persistence for ACL policy triples.
#[async_trait]
pub trait AclPolicyRepository: Send + Sync {
    /// Returns `false` when the triple was already present.
    async fn add_policy(&self, subject: &str, object: &str, action: &str) -> EngineResult<bool>;
    /// Returns `false` when the triple was absent.
    async fn remove_policy(&self, subject: &str, object: &str, action: &str)
    -> EngineResult<bool>;
    /// Full replay, used to rebuild the cache at bootstrap.
    async fn load_policies(&self) -> EngineResult<Vec<PolicyTriple>>;
}

/// Persistence for RBAC policy triples and flat role assignments.
#[async_trait]
pub trait RbacPolicyRepository: Send + Sync {
    async fn add_policy(&self, subject: &str, object: &str, action: &str) -> EngineResult<bool>;
    async fn remove_policy(&self, subject: &str, object: &str, action: &str)
    -> EngineResult<bool>;
    async fn load_policies(&self) -> EngineResult<Vec<PolicyTriple>>;

    async fn add_role_for_user(&self, user: &str, role: &str) -> EngineResult<bool>;
    async fn remove_role_for_user(&self, user: &str, role: &str) -> EngineResult<bool>;
    async fn load_role_assignments(&self) -> EngineResult<Vec<RoleAssignment>>;
}

/// Persistence for ABAC policies including their conditions.
#[async_trait]
pub trait AbacPolicyRepository: Send + Sync {
    async fn add_policy(&self, policy: &AbacPolicy) -> EngineResult<()>;
    /// Replaces the policy record and its conditions atomically.
    async fn update_policy(&self, policy: &AbacPolicy) -> EngineResult<()>;
    async fn remove_policy(&self, policy_id: &str) -> EngineResult<()>;
    async fn load_policies(&self) -> EngineResult<Vec<AbacPolicy>>;
}

/// Per-key persistence for user and object attribute tuples.
#[async_trait]
pub trait AttributeRepository: Send + Sync {
    async fn set_user_attribute(&self, user: &str, name: &str, value: &str) -> EngineResult<()>;
    async fn get_user_attributes(&self, user: &str) -> EngineResult<HashMap<String, String>>;
    async fn remove_user_attribute(&self, user: &str, name: &str) -> EngineResult<()>;

    async fn set_object_attribute(&self, object: &str, name: &str, value: &str)
    -> EngineResult<()>;
    async fn get_object_attributes(&self, object: &str) -> EngineResult<HashMap<String, String>>;
    async fn remove_object_attribute(&self, object: &str, name: &str) -> EngineResult<()>;
}

/// Persistence for ReBAC relationship edges.
#[async_trait]
pub trait RebacRepository: Send + Sync {
    async fn add_relationship(
        &self,
        subject: &str,
        relationship: &str,
        object: &str,
    ) -> EngineResult<()>;
    /// Silent when the edge is absent.
    async fn remove_relationship(
        &self,
        subject: &str,
        relationship: &str,
        object: &str,
    ) -> EngineResult<()>;
    async fn load_relationships(&self) -> EngineResult<Vec<Relationship>>;
}
