//! Decision service HTTP API module.
//!
//! # Purpose and responsibility
//! Exposes the route handler modules and the shared engine-access helpers
//! used across them.
//!
//! # Key invariants and assumptions
//! - A model whose engine is not configured yields 503 before any work.
//! - Error shapes are standardized via `api::error`.
pub mod abac;
pub mod attributes;
pub mod enforce;
pub mod error;
pub mod openapi;
pub mod policies;
pub mod relationships;
pub mod roles;
pub mod system;
pub mod types;

use crate::api::error::{ApiError, api_model_unavailable};
use crate::app::AppState;
use std::sync::Arc;
use verdict_engine::abac::AbacEngine;
use verdict_engine::acl::AclEngine;
use verdict_engine::rbac::RbacEngine;
use verdict_engine::rebac::RebacEngine;

pub(crate) fn acl_engine(state: &AppState) -> Result<Arc<AclEngine>, ApiError> {
    state
        .authz
        .acl()
        .cloned()
        .ok_or_else(|| api_model_unavailable("acl"))
}

pub(crate) fn rbac_engine(state: &AppState) -> Result<Arc<RbacEngine>, ApiError> {
    state
        .authz
        .rbac()
        .cloned()
        .ok_or_else(|| api_model_unavailable("rbac"))
}

pub(crate) fn abac_engine(state: &AppState) -> Result<Arc<AbacEngine>, ApiError> {
    state
        .authz
        .abac()
        .cloned()
        .ok_or_else(|| api_model_unavailable("abac"))
}

pub(crate) fn rebac_engine(state: &AppState) -> Result<Arc<RebacEngine>, ApiError> {
    state
        .authz
        .rebac()
        .cloned()
        .ok_or_else(|| api_model_unavailable("rebac"))
}
