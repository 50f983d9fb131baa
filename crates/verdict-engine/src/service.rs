//! Model dispatcher: routes a decision request to the configured engine.
//!
//! The dispatcher performs no evaluation logic of its own. It substitutes
//! the default model for an empty selector, rejects unknown selectors, and
//! reports models with no configured engine as unavailable.
use crate::abac::AbacEngine;
use crate::acl::AclEngine;
use crate::error::{EngineError, EngineResult};
use crate::model::{AccessModel, Decision};
use crate::rbac::RbacEngine;
use crate::rebac::RebacEngine;
use std::collections::HashMap;
use std::sync::Arc;

/// Substituted when a request does not name a model.
pub const DEFAULT_MODEL: AccessModel = AccessModel::Rbac;

/// Holds the enabled engines. An engine left unconfigured disables its
/// model for this instance.
pub struct AuthorizationService {
    acl: Option<Arc<AclEngine>>,
    rbac: Option<Arc<RbacEngine>>,
    abac: Option<Arc<AbacEngine>>,
    rebac: Option<Arc<RebacEngine>>,
}

impl AuthorizationService {
    pub fn new(
        acl: Option<Arc<AclEngine>>,
        rbac: Option<Arc<RbacEngine>>,
        abac: Option<Arc<AbacEngine>>,
        rebac: Option<Arc<RebacEngine>>,
    ) -> Self {
        Self {
            acl,
            rbac,
            abac,
            rebac,
        }
    }

    pub fn acl(&self) -> Option<&Arc<AclEngine>> {
        self.acl.as_ref()
    }

    pub fn rbac(&self) -> Option<&Arc<RbacEngine>> {
        self.rbac.as_ref()
    }

    pub fn abac(&self) -> Option<&Arc<AbacEngine>> {
        self.abac.as_ref()
    }

    pub fn rebac(&self) -> Option<&Arc<RebacEngine>> {
        self.rebac.as_ref()
    }

    /// Models with a configured engine, in wire order.
    pub fn enabled_models(&self) -> Vec<AccessModel> {
        let mut models = Vec::new();
        if self.acl.is_some() {
            models.push(AccessModel::Acl);
        }
        if self.rbac.is_some() {
            models.push(AccessModel::Rbac);
        }
        if self.abac.is_some() {
            models.push(AccessModel::Abac);
        }
        if self.rebac.is_some() {
            models.push(AccessModel::Rebac);
        }
        models
    }

    /// Resolves the model selector. An empty selector means the default
    /// model; anything unrecognized is invalid input.
    pub fn resolve_model(model: &str) -> EngineResult<AccessModel> {
        if model.is_empty() {
            return Ok(DEFAULT_MODEL);
        }
        model
            .parse::<AccessModel>()
            .map_err(|_| EngineError::InvalidInput(format!("invalid access model: {model}")))
    }

    /// Dispatches one decision request to exactly one engine.
    pub async fn enforce(
        &self,
        model: &str,
        subject: &str,
        object: &str,
        action: &str,
        attributes: &HashMap<String, String>,
    ) -> EngineResult<Decision> {
        let model = Self::resolve_model(model)?;
        match model {
            AccessModel::Acl => {
                let engine = self.acl.as_ref().ok_or_else(|| unavailable(model))?;
                Ok(Decision {
                    allowed: engine.enforce(subject, object, action).await,
                    path: String::new(),
                })
            }
            AccessModel::Rbac => {
                let engine = self.rbac.as_ref().ok_or_else(|| unavailable(model))?;
                Ok(Decision {
                    allowed: engine.enforce(subject, object, action).await,
                    path: String::new(),
                })
            }
            AccessModel::Abac => {
                let engine = self.abac.as_ref().ok_or_else(|| unavailable(model))?;
                let allowed = engine.enforce(subject, object, action, attributes).await?;
                Ok(Decision {
                    allowed,
                    path: String::new(),
                })
            }
            AccessModel::Rebac => {
                let engine = self.rebac.as_ref().ok_or_else(|| unavailable(model))?;
                let (allowed, path) = engine.enforce(subject, object, action).await;
                Ok(Decision { allowed, path })
            }
        }
    }
}

fn unavailable(model: AccessModel) -> EngineError {
    EngineError::ServiceUnavailable(format!("no engine configured for model {model}"))
}
