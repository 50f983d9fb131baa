//! Multi-model authorization decision engines shared by the Verdict service.
//!
//! # Purpose
//! Centralizes the decision logic for the four supported access-control
//! models — ACL, RBAC, ABAC, and ReBAC — together with the repository
//! contracts their state is persisted through.
//!
//! # How it fits
//! The `verdictd` service wires these engines to a durable store and exposes
//! them over HTTP. Each engine owns an in-memory cache that mirrors its
//! repository: reads are pure cache lookups, writes go through the
//! repository first and mutate the cache only after the write succeeds, and
//! restart-time replay reconstructs the cache from the repository.
//!
//! # Key invariants
//! - A single `enforce` call observes one consistent snapshot of an
//!   engine's cache (one read-lock acquisition per call).
//! - Decision reads never fail with `NotFound`; unknown principals simply
//!   evaluate to a deny.
//! - Repository failures surface as [`EngineError::Storage`], never as a
//!   silent deny.
//!
//! # Examples
//! ```rust
//! use std::sync::Arc;
//! use verdict_engine::{acl::AclEngine, memory::MemoryStore};
//!
//! # async fn demo() -> verdict_engine::EngineResult<()> {
//! let store = Arc::new(MemoryStore::new());
//! let acl = AclEngine::bootstrap(store).await?;
//! acl.add_policy("alice", "doc1", "read").await?;
//! assert!(acl.enforce("alice", "doc1", "read").await);
//! # Ok(())
//! # }
//! ```

pub mod abac;
pub mod acl;
pub mod clock;
pub mod error;
pub mod memory;
pub mod model;
pub mod rbac;
pub mod rebac;
pub mod repository;
pub mod service;

pub use error::{EngineError, EngineResult};
pub use model::{
    AbacPolicy, AccessModel, Decision, PolicyCondition, PolicyTriple, Relationship,
    RoleAssignment,
};
pub use service::AuthorizationService;
