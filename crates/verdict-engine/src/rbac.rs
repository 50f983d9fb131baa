//! RBAC decision engine: role resolution plus policy match.
//!
//! The role model is flat. A role is a terminal principal: `enforce`
//! substitutes each of the user's roles into the policy lookup exactly
//! once, with no role-to-role indirection.
use crate::error::EngineResult;
use crate::model::{PolicyTriple, RoleAssignment};
use crate::repository::RbacPolicyRepository;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Policy triples and user-to-role edges behind a single lock so one read
/// acquisition observes both consistently.
#[derive(Default)]
struct RbacCache {
    policies: HashSet<PolicyTriple>,
    roles: HashMap<String, BTreeSet<String>>,
}

pub struct RbacEngine {
    repo: Arc<dyn RbacPolicyRepository>,
    cache: RwLock<RbacCache>,
}

impl RbacEngine {
    /// Builds the engine and replays policies and role assignments.
    pub async fn bootstrap(repo: Arc<dyn RbacPolicyRepository>) -> EngineResult<Self> {
        let engine = Self {
            repo,
            cache: RwLock::new(RbacCache::default()),
        };
        engine.reload().await?;
        Ok(engine)
    }

    /// Replaces the cache with a full replay of the repository.
    pub async fn reload(&self) -> EngineResult<()> {
        let policies = self.repo.load_policies().await?;
        let assignments = self.repo.load_role_assignments().await?;
        let mut cache = self.cache.write().await;
        cache.policies = policies.into_iter().collect();
        cache.roles.clear();
        for assignment in assignments {
            cache
                .roles
                .entry(assignment.user)
                .or_default()
                .insert(assignment.role);
        }
        tracing::debug!(
            policies = cache.policies.len(),
            users = cache.roles.len(),
            "rbac cache replayed"
        );
        Ok(())
    }

    /// True iff the triple matches directly, or through any role assigned
    /// to the subject. OR semantics: the first success terminates.
    pub async fn enforce(&self, subject: &str, object: &str, action: &str) -> bool {
        let cache = self.cache.read().await;
        if cache
            .policies
            .contains(&PolicyTriple::new(subject, object, action))
        {
            return true;
        }
        let Some(roles) = cache.roles.get(subject) else {
            return false;
        };
        roles.iter().any(|role| {
            cache
                .policies
                .contains(&PolicyTriple::new(role.as_str(), object, action))
        })
    }

    pub async fn add_policy(
        &self,
        subject: &str,
        object: &str,
        action: &str,
    ) -> EngineResult<bool> {
        let triple = PolicyTriple::new(subject, object, action);
        let mut cache = self.cache.write().await;
        if cache.policies.contains(&triple) {
            return Ok(false);
        }
        self.repo.add_policy(subject, object, action).await?;
        cache.policies.insert(triple);
        Ok(true)
    }

    pub async fn remove_policy(
        &self,
        subject: &str,
        object: &str,
        action: &str,
    ) -> EngineResult<bool> {
        let triple = PolicyTriple::new(subject, object, action);
        let mut cache = self.cache.write().await;
        if !cache.policies.contains(&triple) {
            return Ok(false);
        }
        self.repo.remove_policy(subject, object, action).await?;
        cache.policies.remove(&triple);
        Ok(true)
    }

    pub async fn policies(&self) -> Vec<PolicyTriple> {
        let cache = self.cache.read().await;
        let mut items: Vec<_> = cache.policies.iter().cloned().collect();
        items.sort();
        items
    }

    pub async fn add_role_for_user(&self, user: &str, role: &str) -> EngineResult<bool> {
        let mut cache = self.cache.write().await;
        if cache
            .roles
            .get(user)
            .is_some_and(|roles| roles.contains(role))
        {
            return Ok(false);
        }
        self.repo.add_role_for_user(user, role).await?;
        cache
            .roles
            .entry(user.to_string())
            .or_default()
            .insert(role.to_string());
        Ok(true)
    }

    pub async fn remove_role_for_user(&self, user: &str, role: &str) -> EngineResult<bool> {
        let mut cache = self.cache.write().await;
        let present = cache
            .roles
            .get(user)
            .is_some_and(|roles| roles.contains(role));
        if !present {
            return Ok(false);
        }
        self.repo.remove_role_for_user(user, role).await?;
        if let Some(roles) = cache.roles.get_mut(user) {
            roles.remove(role);
            if roles.is_empty() {
                cache.roles.remove(user);
            }
        }
        Ok(true)
    }

    pub async fn roles_for_user(&self, user: &str) -> Vec<String> {
        let cache = self.cache.read().await;
        cache
            .roles
            .get(user)
            .map(|roles| roles.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Snapshot of all role assignments, ordered for stable listings.
    pub async fn role_assignments(&self) -> Vec<RoleAssignment> {
        let cache = self.cache.read().await;
        let mut items = Vec::new();
        for (user, roles) in &cache.roles {
            for role in roles {
                items.push(RoleAssignment::new(user.clone(), role.clone()));
            }
        }
        items.sort();
        items
    }
}
