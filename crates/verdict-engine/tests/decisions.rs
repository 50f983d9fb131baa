//! Cross-engine decision scenarios against the in-memory store.
use std::collections::HashMap;
use std::sync::Arc;
use verdict_engine::abac::AbacEngine;
use verdict_engine::acl::AclEngine;
use verdict_engine::memory::MemoryStore;
use verdict_engine::model::{AbacPolicy, PolicyCondition};
use verdict_engine::rbac::RbacEngine;
use verdict_engine::rebac::RebacEngine;
use verdict_engine::service::AuthorizationService;

async fn service_over(store: Arc<MemoryStore>) -> AuthorizationService {
    AuthorizationService::new(
        Some(Arc::new(
            AclEngine::bootstrap(store.clone()).await.expect("acl"),
        )),
        Some(Arc::new(
            RbacEngine::bootstrap(store.clone()).await.expect("rbac"),
        )),
        Some(Arc::new(
            AbacEngine::bootstrap(store.clone(), store.clone())
                .await
                .expect("abac"),
        )),
        Some(Arc::new(
            RebacEngine::bootstrap(store.clone()).await.expect("rebac"),
        )),
    )
}

fn abac_policy(
    id: &str,
    effect: &str,
    priority: i32,
    conditions: Vec<(&str, &str, &str, &str)>,
) -> AbacPolicy {
    AbacPolicy {
        id: id.to_string(),
        name: format!("policy {id}"),
        description: String::new(),
        effect: effect.to_string(),
        priority,
        conditions: conditions
            .into_iter()
            .map(|(condition_type, field, operator, value)| PolicyCondition {
                condition_type: condition_type.to_string(),
                field: field.to_string(),
                operator: operator.to_string(),
                value: value.to_string(),
                logic_op: String::new(),
            })
            .collect(),
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    }
}

#[tokio::test]
async fn acl_denies_unknown_subject() {
    let store = Arc::new(MemoryStore::new());
    let service = service_over(store).await;
    service
        .acl()
        .expect("acl")
        .add_policy("alice", "doc1", "read")
        .await
        .expect("policy");

    let decision = service
        .enforce("acl", "alice", "doc1", "read", &HashMap::new())
        .await
        .expect("enforce");
    assert!(decision.allowed);

    let decision = service
        .enforce("acl", "bob", "doc1", "read", &HashMap::new())
        .await
        .expect("enforce");
    assert!(!decision.allowed);
}

#[tokio::test]
async fn rbac_grants_through_role() {
    let store = Arc::new(MemoryStore::new());
    let service = service_over(store).await;
    let rbac = service.rbac().expect("rbac");
    rbac.add_policy("admin", "data", "write").await.expect("policy");
    rbac.add_role_for_user("alice", "admin").await.expect("role");

    let decision = service
        .enforce("rbac", "alice", "data", "write", &HashMap::new())
        .await
        .expect("enforce");
    assert!(decision.allowed);
}

#[tokio::test]
async fn abac_priority_arbitration_across_effects() {
    let store = Arc::new(MemoryStore::new());
    let service = service_over(store.clone()).await;
    let abac = service.abac().expect("abac");

    abac.set_user_attributes(
        "dana",
        &HashMap::from([
            ("position".to_string(), "manager".to_string()),
            ("department".to_string(), "engineering".to_string()),
        ]),
    )
    .await
    .expect("attributes");

    abac.add_policy(abac_policy(
        "allow-managers",
        "allow",
        100,
        vec![("user", "position", "eq", "manager")],
    ))
    .await
    .expect("p1");
    abac.add_policy(abac_policy(
        "deny-engineering",
        "deny",
        50,
        vec![("user", "department", "eq", "engineering")],
    ))
    .await
    .expect("p2");

    // The higher-priority allow wins even though the deny also matches.
    let decision = service
        .enforce("abac", "dana", "anything", "read", &HashMap::new())
        .await
        .expect("enforce");
    assert!(decision.allowed);

    // A subject matching only the deny is refused.
    abac.set_user_attributes(
        "erin",
        &HashMap::from([("department".to_string(), "engineering".to_string())]),
    )
    .await
    .expect("attributes");
    let decision = service
        .enforce("abac", "erin", "anything", "read", &HashMap::new())
        .await
        .expect("enforce");
    assert!(!decision.allowed);
}

#[tokio::test]
async fn rebac_group_access_with_explanation() {
    let store = Arc::new(MemoryStore::new());
    let service = service_over(store).await;
    let rebac = service.rebac().expect("rebac");
    rebac
        .add_relationship("alice", "member", "eng_team")
        .await
        .expect("edge");
    rebac
        .add_relationship("eng_team", "group_access", "source_code")
        .await
        .expect("edge");

    let decision = service
        .enforce("rebac", "alice", "source_code", "read", &HashMap::new())
        .await
        .expect("enforce");
    assert!(decision.allowed);
    assert_eq!(
        decision.path,
        "alice -[member]-> eng_team -[group_access]-> source_code"
    );
}

#[tokio::test]
async fn engines_do_not_share_state() {
    let store = Arc::new(MemoryStore::new());
    let service = service_over(store).await;
    service
        .acl()
        .expect("acl")
        .add_policy("alice", "doc1", "read")
        .await
        .expect("policy");

    // The ACL triple must not leak into RBAC or ReBAC decisions.
    let decision = service
        .enforce("rbac", "alice", "doc1", "read", &HashMap::new())
        .await
        .expect("enforce");
    assert!(!decision.allowed);
    let decision = service
        .enforce("rebac", "alice", "doc1", "read", &HashMap::new())
        .await
        .expect("enforce");
    assert!(!decision.allowed);
}

#[tokio::test]
async fn restart_replay_restores_every_engine() {
    let store = Arc::new(MemoryStore::new());
    {
        let service = service_over(store.clone()).await;
        service
            .acl()
            .expect("acl")
            .add_policy("alice", "doc1", "read")
            .await
            .expect("acl policy");
        let rbac = service.rbac().expect("rbac");
        rbac.add_policy("admin", "data", "write").await.expect("policy");
        rbac.add_role_for_user("bob", "admin").await.expect("role");
        service
            .abac()
            .expect("abac")
            .add_policy(abac_policy(
                "allow-alice",
                "allow",
                1,
                vec![("subject", "subject", "eq", "alice")],
            ))
            .await
            .expect("abac policy");
        service
            .rebac()
            .expect("rebac")
            .add_relationship("carol", "owner", "doc2")
            .await
            .expect("edge");
    }

    let service = service_over(store).await;
    for (model, subject, object, action) in [
        ("acl", "alice", "doc1", "read"),
        ("rbac", "bob", "data", "write"),
        ("abac", "alice", "doc1", "read"),
        ("rebac", "carol", "doc2", "delete"),
    ] {
        let decision = service
            .enforce(model, subject, object, action, &HashMap::new())
            .await
            .expect("enforce");
        assert!(decision.allowed, "{model} decision lost after replay");
    }
}
