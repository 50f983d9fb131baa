//! ABAC policy engine: conditional policies with priority-ordered
//! deny/allow arbitration.
//!
//! # Purpose
//! Evaluates attribute-based policies against user, object, environment,
//! and request operands. Policies live in an in-memory cache mirrored from
//! the policy repository; attribute reads go through the attribute
//! repository on every decision so attribute writes are immediately
//! visible.
//!
//! # Failure semantics
//! An `enforce` call that cannot load attributes is a hard error, not an
//! empty attribute set. A successful-but-empty attribute read is normal.
mod condition;

use crate::clock::{Clock, SystemClock};
use crate::error::{EngineError, EngineResult};
use crate::model::{AbacPolicy, EFFECT_ALLOW, EFFECT_DENY};
use crate::repository::{AbacPolicyRepository, AttributeRepository};
use chrono::{Timelike, Utc};
use condition::EvaluationContext;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

pub struct AbacEngine {
    policy_repo: Arc<dyn AbacPolicyRepository>,
    attribute_repo: Arc<dyn AttributeRepository>,
    clock: Arc<dyn Clock>,
    policies: RwLock<HashMap<String, AbacPolicy>>,
}

impl AbacEngine {
    /// Builds the engine with the system clock and replays the policy
    /// repository into the cache.
    pub async fn bootstrap(
        policy_repo: Arc<dyn AbacPolicyRepository>,
        attribute_repo: Arc<dyn AttributeRepository>,
    ) -> EngineResult<Self> {
        Self::bootstrap_with_clock(policy_repo, attribute_repo, Arc::new(SystemClock)).await
    }

    /// Like [`AbacEngine::bootstrap`] with an injected clock, so
    /// time-dependent policies are testable.
    pub async fn bootstrap_with_clock(
        policy_repo: Arc<dyn AbacPolicyRepository>,
        attribute_repo: Arc<dyn AttributeRepository>,
        clock: Arc<dyn Clock>,
    ) -> EngineResult<Self> {
        let engine = Self {
            policy_repo,
            attribute_repo,
            clock,
            policies: RwLock::new(HashMap::new()),
        };
        engine.reload().await?;
        Ok(engine)
    }

    /// Replaces the policy cache with a full replay of the repository.
    pub async fn reload(&self) -> EngineResult<()> {
        let records = self.policy_repo.load_policies().await?;
        let mut policies = self.policies.write().await;
        policies.clear();
        for policy in records {
            policies.insert(policy.id.clone(), policy);
        }
        tracing::debug!(policies = policies.len(), "abac policy cache replayed");
        Ok(())
    }

    /// Evaluates all policies in descending priority order; the first
    /// match decides. No match is a deny.
    pub async fn enforce(
        &self,
        subject: &str,
        object: &str,
        action: &str,
        request_attributes: &HashMap<String, String>,
    ) -> EngineResult<bool> {
        let user_attributes = self.attribute_repo.get_user_attributes(subject).await?;
        let object_attributes = self.attribute_repo.get_object_attributes(object).await?;

        let now = self.clock.now();
        let mut environment_attributes = HashMap::new();
        environment_attributes.insert("time".to_string(), now.hour().to_string());
        environment_attributes.insert("date".to_string(), now.format("%Y-%m-%d").to_string());
        environment_attributes.insert("day".to_string(), now.format("%A").to_string());
        // Request attributes override the clock-derived defaults; a
        // request-supplied `hour` also rewrites `time`.
        for (key, value) in request_attributes {
            environment_attributes.insert(key.clone(), value.clone());
        }
        if let Some(hour) = request_attributes.get("hour") {
            environment_attributes.insert("time".to_string(), hour.clone());
        }

        let ctx = EvaluationContext {
            user_attributes,
            object_attributes,
            environment_attributes,
            action_attributes: HashMap::new(),
            subject,
            object,
            action,
        };

        let mut ranked: Vec<AbacPolicy> = {
            let policies = self.policies.read().await;
            policies.values().cloned().collect()
        };
        ranked.sort_by_key(|policy| std::cmp::Reverse(policy.priority));

        for policy in &ranked {
            if condition::policy_matches(policy, &ctx) {
                match policy.effect.as_str() {
                    EFFECT_ALLOW => return Ok(true),
                    EFFECT_DENY => return Ok(false),
                    _ => {}
                }
            }
        }
        Ok(false)
    }

    /// Validates and stores a new policy; `created_at`/`updated_at` are
    /// stamped here, not taken from the caller.
    pub async fn add_policy(&self, mut policy: AbacPolicy) -> EngineResult<AbacPolicy> {
        policy.validate()?;
        let mut policies = self.policies.write().await;
        if policies.contains_key(&policy.id) {
            return Err(EngineError::AlreadyExists(format!(
                "abac policy {}",
                policy.id
            )));
        }
        let now = self.clock.now().with_timezone(&Utc);
        policy.created_at = now;
        policy.updated_at = now;
        self.policy_repo.add_policy(&policy).await?;
        policies.insert(policy.id.clone(), policy.clone());
        Ok(policy)
    }

    /// Replaces an existing policy and its conditions. The stored
    /// `created_at` is preserved; `updated_at` is stamped.
    pub async fn update_policy(&self, mut policy: AbacPolicy) -> EngineResult<AbacPolicy> {
        policy.validate()?;
        let mut policies = self.policies.write().await;
        let Some(existing) = policies.get(&policy.id) else {
            return Err(EngineError::NotFound(format!("abac policy {}", policy.id)));
        };
        policy.created_at = existing.created_at;
        policy.updated_at = self.clock.now().with_timezone(&Utc);
        self.policy_repo.update_policy(&policy).await?;
        policies.insert(policy.id.clone(), policy.clone());
        Ok(policy)
    }

    pub async fn remove_policy(&self, policy_id: &str) -> EngineResult<()> {
        let mut policies = self.policies.write().await;
        if !policies.contains_key(policy_id) {
            return Err(EngineError::NotFound(format!("abac policy {policy_id}")));
        }
        self.policy_repo.remove_policy(policy_id).await?;
        policies.remove(policy_id);
        Ok(())
    }

    pub async fn policy(&self, policy_id: &str) -> EngineResult<AbacPolicy> {
        self.policies
            .read()
            .await
            .get(policy_id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(format!("abac policy {policy_id}")))
    }

    pub async fn policies(&self) -> Vec<AbacPolicy> {
        let policies = self.policies.read().await;
        let mut items: Vec<_> = policies.values().cloned().collect();
        items.sort_by(|a, b| a.id.cmp(&b.id));
        items
    }

    /// Partial failure is not rolled back; the caller may retry the whole
    /// operation.
    pub async fn set_user_attributes(
        &self,
        user: &str,
        attributes: &HashMap<String, String>,
    ) -> EngineResult<()> {
        for (name, value) in attributes {
            self.attribute_repo
                .set_user_attribute(user, name, value)
                .await?;
        }
        Ok(())
    }

    pub async fn user_attributes(&self, user: &str) -> EngineResult<HashMap<String, String>> {
        self.attribute_repo.get_user_attributes(user).await
    }

    pub async fn remove_user_attribute(&self, user: &str, name: &str) -> EngineResult<()> {
        self.attribute_repo.remove_user_attribute(user, name).await
    }

    pub async fn set_object_attributes(
        &self,
        object: &str,
        attributes: &HashMap<String, String>,
    ) -> EngineResult<()> {
        for (name, value) in attributes {
            self.attribute_repo
                .set_object_attribute(object, name, value)
                .await?;
        }
        Ok(())
    }

    pub async fn object_attributes(&self, object: &str) -> EngineResult<HashMap<String, String>> {
        self.attribute_repo.get_object_attributes(object).await
    }

    pub async fn remove_object_attribute(&self, object: &str, name: &str) -> EngineResult<()> {
        self.attribute_repo
            .remove_object_attribute(object, name)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::memory::MemoryStore;
    use crate::model::PolicyCondition;
    use async_trait::async_trait;
    use chrono::{Local, TimeZone};

    fn condition(
        condition_type: &str,
        field: &str,
        operator: &str,
        value: &str,
        logic_op: &str,
    ) -> PolicyCondition {
        PolicyCondition {
            condition_type: condition_type.to_string(),
            field: field.to_string(),
            operator: operator.to_string(),
            value: value.to_string(),
            logic_op: logic_op.to_string(),
        }
    }

    fn policy(id: &str, effect: &str, priority: i32, conditions: Vec<PolicyCondition>) -> AbacPolicy {
        AbacPolicy {
            id: id.to_string(),
            name: format!("policy {id}"),
            description: String::new(),
            effect: effect.to_string(),
            priority,
            conditions,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    // Monday 2026-03-02 14:30 local time.
    fn fixed_clock() -> Arc<FixedClock> {
        Arc::new(FixedClock(
            Local.with_ymd_and_hms(2026, 3, 2, 14, 30, 0).unwrap(),
        ))
    }

    async fn engine_with_store() -> (AbacEngine, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let engine =
            AbacEngine::bootstrap_with_clock(store.clone(), store.clone(), fixed_clock())
                .await
                .expect("bootstrap");
        (engine, store)
    }

    #[tokio::test]
    async fn default_deny_without_policies() {
        let (engine, _store) = engine_with_store().await;
        let allowed = engine
            .enforce("alice", "doc1", "read", &HashMap::new())
            .await
            .expect("enforce");
        assert!(!allowed);
    }

    #[tokio::test]
    async fn priority_resolution_prefers_higher_priority() {
        let (engine, store) = engine_with_store().await;
        store
            .set_user_attribute("alice", "position", "manager")
            .await
            .expect("attr");
        store
            .set_user_attribute("alice", "department", "engineering")
            .await
            .expect("attr");

        engine
            .add_policy(policy(
                "allow-managers",
                EFFECT_ALLOW,
                100,
                vec![condition("user", "position", "eq", "manager", "")],
            ))
            .await
            .expect("add");
        engine
            .add_policy(policy(
                "deny-engineering",
                EFFECT_DENY,
                50,
                vec![condition("user", "department", "eq", "engineering", "")],
            ))
            .await
            .expect("add");

        let allowed = engine
            .enforce("alice", "doc1", "read", &HashMap::new())
            .await
            .expect("enforce");
        assert!(allowed);
    }

    #[tokio::test]
    async fn matching_deny_policy_refuses() {
        let (engine, store) = engine_with_store().await;
        store
            .set_user_attribute("bob", "department", "engineering")
            .await
            .expect("attr");
        engine
            .add_policy(policy(
                "deny-engineering",
                EFFECT_DENY,
                50,
                vec![condition("user", "department", "eq", "engineering", "")],
            ))
            .await
            .expect("add");

        let allowed = engine
            .enforce("bob", "doc1", "read", &HashMap::new())
            .await
            .expect("enforce");
        assert!(!allowed);
    }

    #[tokio::test]
    async fn zero_condition_policy_never_grants() {
        let (engine, _store) = engine_with_store().await;
        engine
            .add_policy(policy("allow-all", EFFECT_ALLOW, 100, Vec::new()))
            .await
            .expect("add");

        let allowed = engine
            .enforce("alice", "doc1", "read", &HashMap::new())
            .await
            .expect("enforce");
        assert!(!allowed);
    }

    #[tokio::test]
    async fn environment_defaults_come_from_clock() {
        let (engine, _store) = engine_with_store().await;
        engine
            .add_policy(policy(
                "business-hours-monday",
                EFFECT_ALLOW,
                10,
                vec![
                    condition("environment", "time", "eq", "14", "and"),
                    condition("environment", "date", "eq", "2026-03-02", "and"),
                    condition("environment", "day", "eq", "Monday", ""),
                ],
            ))
            .await
            .expect("add");

        let allowed = engine
            .enforce("alice", "doc1", "read", &HashMap::new())
            .await
            .expect("enforce");
        assert!(allowed);
    }

    #[tokio::test]
    async fn request_hour_overrides_clock_time() {
        let (engine, _store) = engine_with_store().await;
        engine
            .add_policy(policy(
                "after-hours",
                EFFECT_ALLOW,
                10,
                vec![condition("environment", "time", "eq", "22", "")],
            ))
            .await
            .expect("add");

        let denied = engine
            .enforce("alice", "doc1", "read", &HashMap::new())
            .await
            .expect("enforce");
        assert!(!denied);

        let mut attributes = HashMap::new();
        attributes.insert("hour".to_string(), "22".to_string());
        let allowed = engine
            .enforce("alice", "doc1", "read", &attributes)
            .await
            .expect("enforce");
        assert!(allowed);
    }

    #[tokio::test]
    async fn request_attributes_override_environment() {
        let (engine, _store) = engine_with_store().await;
        engine
            .add_policy(policy(
                "office-only",
                EFFECT_ALLOW,
                10,
                vec![condition("environment", "location", "eq", "office", "")],
            ))
            .await
            .expect("add");

        let mut attributes = HashMap::new();
        attributes.insert("location".to_string(), "office".to_string());
        let allowed = engine
            .enforce("alice", "doc1", "read", &attributes)
            .await
            .expect("enforce");
        assert!(allowed);
    }

    #[tokio::test]
    async fn in_operator_with_whitespace_list() {
        let (engine, store) = engine_with_store().await;
        store
            .set_user_attribute("alice", "clearance", "top_secret")
            .await
            .expect("attr");
        engine
            .add_policy(policy(
                "cleared",
                EFFECT_ALLOW,
                10,
                vec![condition(
                    "user",
                    "clearance",
                    "in",
                    "secret, top_secret",
                    "",
                )],
            ))
            .await
            .expect("add");

        let allowed = engine
            .enforce("alice", "doc1", "read", &HashMap::new())
            .await
            .expect("enforce");
        assert!(allowed);
    }

    #[tokio::test]
    async fn add_update_remove_lifecycle() {
        let (engine, _store) = engine_with_store().await;
        let created = engine
            .add_policy(policy(
                "p1",
                EFFECT_ALLOW,
                10,
                vec![condition("user", "position", "eq", "manager", "")],
            ))
            .await
            .expect("add");
        assert_eq!(created.created_at, created.updated_at);

        let err = engine
            .add_policy(policy("p1", EFFECT_ALLOW, 10, Vec::new()))
            .await
            .expect_err("duplicate");
        assert!(matches!(err, EngineError::AlreadyExists(_)));

        let mut replacement = policy(
            "p1",
            EFFECT_DENY,
            20,
            vec![condition("user", "position", "eq", "intern", "")],
        );
        replacement.name = "tightened".to_string();
        let updated = engine.update_policy(replacement).await.expect("update");
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.effect, EFFECT_DENY);
        assert_eq!(engine.policy("p1").await.expect("get").priority, 20);

        engine.remove_policy("p1").await.expect("remove");
        let err = engine.remove_policy("p1").await.expect_err("missing");
        assert!(matches!(err, EngineError::NotFound(_)));
        assert!(engine.policies().await.is_empty());
    }

    #[tokio::test]
    async fn invalid_policy_is_rejected() {
        let (engine, _store) = engine_with_store().await;
        let err = engine
            .add_policy(policy("p1", "maybe", 0, Vec::new()))
            .await
            .expect_err("invalid effect");
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn writes_survive_restart_replay() {
        let (engine, store) = engine_with_store().await;
        engine
            .add_policy(policy(
                "p1",
                EFFECT_ALLOW,
                10,
                vec![condition("subject", "subject", "eq", "alice", "")],
            ))
            .await
            .expect("add");
        drop(engine);

        let replayed =
            AbacEngine::bootstrap_with_clock(store.clone(), store, fixed_clock())
                .await
                .expect("bootstrap");
        assert!(
            replayed
                .enforce("alice", "doc1", "read", &HashMap::new())
                .await
                .expect("enforce")
        );
    }

    struct FailingAttributes;

    #[async_trait]
    impl AttributeRepository for FailingAttributes {
        async fn set_user_attribute(&self, _: &str, _: &str, _: &str) -> EngineResult<()> {
            Err(EngineError::Storage(anyhow::anyhow!("attribute store down")))
        }

        async fn get_user_attributes(&self, _: &str) -> EngineResult<HashMap<String, String>> {
            Err(EngineError::Storage(anyhow::anyhow!("attribute store down")))
        }

        async fn remove_user_attribute(&self, _: &str, _: &str) -> EngineResult<()> {
            Err(EngineError::Storage(anyhow::anyhow!("attribute store down")))
        }

        async fn set_object_attribute(&self, _: &str, _: &str, _: &str) -> EngineResult<()> {
            Err(EngineError::Storage(anyhow::anyhow!("attribute store down")))
        }

        async fn get_object_attributes(&self, _: &str) -> EngineResult<HashMap<String, String>> {
            Err(EngineError::Storage(anyhow::anyhow!("attribute store down")))
        }

        async fn remove_object_attribute(&self, _: &str, _: &str) -> EngineResult<()> {
            Err(EngineError::Storage(anyhow::anyhow!("attribute store down")))
        }
    }

    #[tokio::test]
    async fn attribute_load_failure_is_a_hard_error() {
        let store = Arc::new(MemoryStore::new());
        let engine = AbacEngine::bootstrap_with_clock(
            store,
            Arc::new(FailingAttributes),
            fixed_clock(),
        )
        .await
        .expect("bootstrap");

        let err = engine
            .enforce("alice", "doc1", "read", &HashMap::new())
            .await
            .expect_err("storage failure must surface");
        assert!(matches!(err, EngineError::Storage(_)));
    }
}
