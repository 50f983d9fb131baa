//! ACL decision engine: exact-match triple lookup.
use crate::error::EngineResult;
use crate::model::PolicyTriple;
use crate::repository::AclPolicyRepository;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Decides requests by exact string equality against a set of
/// `(subject, object, action)` triples mirrored from the repository.
pub struct AclEngine {
    repo: Arc<dyn AclPolicyRepository>,
    policies: RwLock<HashSet<PolicyTriple>>,
}

impl AclEngine {
    /// Builds the engine and replays the repository into the cache.
    pub async fn bootstrap(repo: Arc<dyn AclPolicyRepository>) -> EngineResult<Self> {
        let engine = Self {
            repo,
            policies: RwLock::new(HashSet::new()),
        };
        engine.reload().await?;
        Ok(engine)
    }

    /// Replaces the cache with a full replay of the repository.
    pub async fn reload(&self) -> EngineResult<()> {
        let records = self.repo.load_policies().await?;
        let mut policies = self.policies.write().await;
        policies.clear();
        policies.extend(records);
        tracing::debug!(policies = policies.len(), "acl cache replayed");
        Ok(())
    }

    /// Pure cache lookup; never suspends on the repository.
    pub async fn enforce(&self, subject: &str, object: &str, action: &str) -> bool {
        let policies = self.policies.read().await;
        policies.contains(&PolicyTriple::new(subject, object, action))
    }

    /// Returns `false` without touching the repository when the triple is
    /// already present. The repository write happens before the cache
    /// mutation; a failed write leaves the cache untouched.
    pub async fn add_policy(
        &self,
        subject: &str,
        object: &str,
        action: &str,
    ) -> EngineResult<bool> {
        let triple = PolicyTriple::new(subject, object, action);
        let mut policies = self.policies.write().await;
        if policies.contains(&triple) {
            return Ok(false);
        }
        self.repo.add_policy(subject, object, action).await?;
        policies.insert(triple);
        Ok(true)
    }

    /// Returns `false` when the triple was absent.
    pub async fn remove_policy(
        &self,
        subject: &str,
        object: &str,
        action: &str,
    ) -> EngineResult<bool> {
        let triple = PolicyTriple::new(subject, object, action);
        let mut policies = self.policies.write().await;
        if !policies.contains(&triple) {
            return Ok(false);
        }
        self.repo.remove_policy(subject, object, action).await?;
        policies.remove(&triple);
        Ok(true)
    }

    /// Snapshot of the policy set, ordered for stable listings.
    pub async fn policies(&self) -> Vec<PolicyTriple> {
        let policies = self.policies.read().await;
        let mut items: Vec<_> = policies.iter().cloned().collect();
        items.sort();
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    async fn engine_with_store() -> (AclEngine, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let engine = AclEngine::bootstrap(store.clone()).await.expect("bootstrap");
        (engine, store)
    }

    #[tokio::test]
    async fn enforce_is_exact_match() {
        let (engine, _store) = engine_with_store().await;
        engine.add_policy("alice", "doc1", "read").await.expect("add");

        assert!(engine.enforce("alice", "doc1", "read").await);
        assert!(!engine.enforce("bob", "doc1", "read").await);
        assert!(!engine.enforce("alice", "doc2", "read").await);
        assert!(!engine.enforce("alice", "doc1", "write").await);
    }

    #[tokio::test]
    async fn add_and_remove_report_set_membership() {
        let (engine, _store) = engine_with_store().await;

        assert!(engine.add_policy("alice", "doc1", "read").await.expect("add"));
        assert!(
            !engine
                .add_policy("alice", "doc1", "read")
                .await
                .expect("re-add")
        );
        assert!(
            engine
                .remove_policy("alice", "doc1", "read")
                .await
                .expect("remove")
        );
        assert!(
            !engine
                .remove_policy("alice", "doc1", "read")
                .await
                .expect("re-remove")
        );
        assert!(engine.policies().await.is_empty());
    }

    #[tokio::test]
    async fn add_then_remove_restores_original_state() {
        let (engine, _store) = engine_with_store().await;
        engine.add_policy("alice", "doc1", "read").await.expect("add");
        let before = engine.policies().await;

        engine.add_policy("bob", "doc2", "write").await.expect("add");
        engine
            .remove_policy("bob", "doc2", "write")
            .await
            .expect("remove");

        assert_eq!(engine.policies().await, before);
    }

    #[tokio::test]
    async fn writes_survive_restart_replay() {
        let (engine, store) = engine_with_store().await;
        engine.add_policy("alice", "doc1", "read").await.expect("add");
        drop(engine);

        let replayed = AclEngine::bootstrap(store).await.expect("bootstrap");
        assert!(replayed.enforce("alice", "doc1", "read").await);
    }
}
