// Verdict decision service (HTTP)
// -------------------------------
// This binary exposes the multi-model authorization API: a decision
// endpoint that dispatches to the ACL, RBAC, ABAC, or ReBAC engine, plus
// the administrative surface for policies, roles, attributes, and
// relationships.
//
// Storage model:
// - Pluggable repositories: in-memory (default) or SQLite when VERDICT_DB
//   is set. One store instance backs all four engines.
// - Engines replay the store into their caches at startup and write
//   through on every mutation, so a restart reconstructs the same state.
use anyhow::Result;
use std::sync::Arc;
use verdict_engine::abac::AbacEngine;
use verdict_engine::acl::AclEngine;
use verdict_engine::memory::MemoryStore;
use verdict_engine::rbac::RbacEngine;
use verdict_engine::rebac::RebacEngine;
use verdict_engine::repository::{
    AbacPolicyRepository, AclPolicyRepository, AttributeRepository, RbacPolicyRepository,
    RebacRepository,
};
use verdict_engine::service::AuthorizationService;
use verdictd::app::{AppState, build_router};
use verdictd::config::VerdictConfig;
use verdictd::observability;
use verdictd::store::SqliteStore;

#[tokio::main]
async fn main() -> Result<()> {
    let metrics_handle = observability::init_observability("verdictd");

    let config = VerdictConfig::from_env_or_yaml()?;

    let authz = match &config.database_url {
        Some(url) => {
            let store = Arc::new(SqliteStore::connect(url).await?);
            tracing::info!(backend = "sqlite", %url, "decision store ready");
            bootstrap_engines(store).await?
        }
        None => {
            let store = Arc::new(MemoryStore::new());
            tracing::info!(backend = "memory", "decision store ready (not durable)");
            bootstrap_engines(store).await?
        }
    };

    let state = AppState {
        authz: Arc::new(authz),
    };

    tokio::spawn(observability::serve_metrics(
        metrics_handle,
        config.metrics_bind,
    ));

    let app = build_router(state);
    let addr = config.bind_addr;
    tracing::info!(%addr, "decision service listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

// One store instance implements every repository contract; each engine
// receives it under the trait it consumes and replays its own tables.
async fn bootstrap_engines<S>(store: Arc<S>) -> Result<AuthorizationService>
where
    S: AclPolicyRepository
        + RbacPolicyRepository
        + AbacPolicyRepository
        + AttributeRepository
        + RebacRepository
        + Send
        + Sync
        + 'static,
{
    let acl = AclEngine::bootstrap(store.clone() as Arc<dyn AclPolicyRepository>).await?;
    let rbac = RbacEngine::bootstrap(store.clone() as Arc<dyn RbacPolicyRepository>).await?;
    let abac = AbacEngine::bootstrap(
        store.clone() as Arc<dyn AbacPolicyRepository>,
        store.clone() as Arc<dyn AttributeRepository>,
    )
    .await?;
    let rebac = RebacEngine::bootstrap(store as Arc<dyn RebacRepository>).await?;
    Ok(AuthorizationService::new(
        Some(Arc::new(acl)),
        Some(Arc::new(rbac)),
        Some(Arc::new(abac)),
        Some(Arc::new(rebac)),
    ))
}
