//! In-memory implementation of every repository contract.
//!
//! # Purpose
//! Backs the engines with plain `HashMap`/`HashSet` state guarded by
//! `tokio::sync::RwLock`. It exists for:
//! - local development and tests (no external dependencies)
//! - deployments where durability is not required
//!
//! # Durability and consistency
//! - **Not durable**: all state is lost on process restart.
//! - **Single-process consistency**: write locks for mutations, read locks
//!   for reads.
//! - **No multi-node coordination**: each instance has independent state.
use crate::error::{EngineError, EngineResult};
use crate::model::{AbacPolicy, PolicyTriple, Relationship, RoleAssignment};
use crate::repository::{
    AbacPolicyRepository, AclPolicyRepository, AttributeRepository, RbacPolicyRepository,
    RebacRepository,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

/// In-memory store implementing all five repository contracts.
///
/// ACL and RBAC policy sets are kept separately so the engines mirror
/// disjoint state, matching a relational backend with one table per record
/// type. Relationship edges are stored without deduplication-by-read: a
/// duplicate add is ignored, so the first write wins.
#[derive(Default)]
pub struct MemoryStore {
    acl_policies: RwLock<HashSet<PolicyTriple>>,
    rbac_policies: RwLock<HashSet<PolicyTriple>>,
    role_assignments: RwLock<HashSet<RoleAssignment>>,
    abac_policies: RwLock<HashMap<String, AbacPolicy>>,
    user_attributes: RwLock<HashMap<String, HashMap<String, String>>>,
    object_attributes: RwLock<HashMap<String, HashMap<String, String>>>,
    relationships: RwLock<Vec<Relationship>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AclPolicyRepository for MemoryStore {
    async fn add_policy(&self, subject: &str, object: &str, action: &str) -> EngineResult<bool> {
        let mut policies = self.acl_policies.write().await;
        Ok(policies.insert(PolicyTriple::new(subject, object, action)))
    }

    async fn remove_policy(
        &self,
        subject: &str,
        object: &str,
        action: &str,
    ) -> EngineResult<bool> {
        let mut policies = self.acl_policies.write().await;
        Ok(policies.remove(&PolicyTriple::new(subject, object, action)))
    }

    async fn load_policies(&self) -> EngineResult<Vec<PolicyTriple>> {
        Ok(self.acl_policies.read().await.iter().cloned().collect())
    }
}

#[async_trait]
impl RbacPolicyRepository for MemoryStore {
    async fn add_policy(&self, subject: &str, object: &str, action: &str) -> EngineResult<bool> {
        let mut policies = self.rbac_policies.write().await;
        Ok(policies.insert(PolicyTriple::new(subject, object, action)))
    }

    async fn remove_policy(
        &self,
        subject: &str,
        object: &str,
        action: &str,
    ) -> EngineResult<bool> {
        let mut policies = self.rbac_policies.write().await;
        Ok(policies.remove(&PolicyTriple::new(subject, object, action)))
    }

    async fn load_policies(&self) -> EngineResult<Vec<PolicyTriple>> {
        Ok(self.rbac_policies.read().await.iter().cloned().collect())
    }

    async fn add_role_for_user(&self, user: &str, role: &str) -> EngineResult<bool> {
        let mut assignments = self.role_assignments.write().await;
        Ok(assignments.insert(RoleAssignment::new(user, role)))
    }

    async fn remove_role_for_user(&self, user: &str, role: &str) -> EngineResult<bool> {
        let mut assignments = self.role_assignments.write().await;
        Ok(assignments.remove(&RoleAssignment::new(user, role)))
    }

    async fn load_role_assignments(&self) -> EngineResult<Vec<RoleAssignment>> {
        Ok(self.role_assignments.read().await.iter().cloned().collect())
    }
}

#[async_trait]
impl AbacPolicyRepository for MemoryStore {
    async fn add_policy(&self, policy: &AbacPolicy) -> EngineResult<()> {
        let mut policies = self.abac_policies.write().await;
        if policies.contains_key(&policy.id) {
            return Err(EngineError::AlreadyExists(format!(
                "abac policy {}",
                policy.id
            )));
        }
        policies.insert(policy.id.clone(), policy.clone());
        Ok(())
    }

    async fn update_policy(&self, policy: &AbacPolicy) -> EngineResult<()> {
        let mut policies = self.abac_policies.write().await;
        if !policies.contains_key(&policy.id) {
            return Err(EngineError::NotFound(format!("abac policy {}", policy.id)));
        }
        policies.insert(policy.id.clone(), policy.clone());
        Ok(())
    }

    async fn remove_policy(&self, policy_id: &str) -> EngineResult<()> {
        let mut policies = self.abac_policies.write().await;
        if policies.remove(policy_id).is_none() {
            return Err(EngineError::NotFound(format!("abac policy {policy_id}")));
        }
        Ok(())
    }

    async fn load_policies(&self) -> EngineResult<Vec<AbacPolicy>> {
        Ok(self.abac_policies.read().await.values().cloned().collect())
    }
}

#[async_trait]
impl AttributeRepository for MemoryStore {
    async fn set_user_attribute(&self, user: &str, name: &str, value: &str) -> EngineResult<()> {
        let mut attributes = self.user_attributes.write().await;
        attributes
            .entry(user.to_string())
            .or_default()
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    async fn get_user_attributes(&self, user: &str) -> EngineResult<HashMap<String, String>> {
        Ok(self
            .user_attributes
            .read()
            .await
            .get(user)
            .cloned()
            .unwrap_or_default())
    }

    async fn remove_user_attribute(&self, user: &str, name: &str) -> EngineResult<()> {
        let mut attributes = self.user_attributes.write().await;
        let removed = attributes
            .get_mut(user)
            .and_then(|entries| entries.remove(name));
        if removed.is_none() {
            return Err(EngineError::NotFound(format!(
                "user attribute {name} for {user}"
            )));
        }
        Ok(())
    }

    async fn set_object_attribute(
        &self,
        object: &str,
        name: &str,
        value: &str,
    ) -> EngineResult<()> {
        let mut attributes = self.object_attributes.write().await;
        attributes
            .entry(object.to_string())
            .or_default()
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    async fn get_object_attributes(&self, object: &str) -> EngineResult<HashMap<String, String>> {
        Ok(self
            .object_attributes
            .read()
            .await
            .get(object)
            .cloned()
            .unwrap_or_default())
    }

    async fn remove_object_attribute(&self, object: &str, name: &str) -> EngineResult<()> {
        let mut attributes = self.object_attributes.write().await;
        let removed = attributes
            .get_mut(object)
            .and_then(|entries| entries.remove(name));
        if removed.is_none() {
            return Err(EngineError::NotFound(format!(
                "object attribute {name} for {object}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl RebacRepository for MemoryStore {
    async fn add_relationship(
        &self,
        subject: &str,
        relationship: &str,
        object: &str,
    ) -> EngineResult<()> {
        let edge = Relationship::new(subject, relationship, object);
        let mut edges = self.relationships.write().await;
        if !edges.contains(&edge) {
            edges.push(edge);
        }
        Ok(())
    }

    async fn remove_relationship(
        &self,
        subject: &str,
        relationship: &str,
        object: &str,
    ) -> EngineResult<()> {
        let edge = Relationship::new(subject, relationship, object);
        let mut edges = self.relationships.write().await;
        if let Some(position) = edges.iter().position(|candidate| candidate == &edge) {
            edges.remove(position);
        }
        Ok(())
    }

    async fn load_relationships(&self) -> EngineResult<Vec<Relationship>> {
        Ok(self.relationships.read().await.clone())
    }
}
