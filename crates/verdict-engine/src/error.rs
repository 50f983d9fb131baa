use thiserror::Error;

/// Error kinds surfaced by the decision engines and their repositories.
///
/// Administrative operations report these to the caller. Decision reads are
/// different: an absent subject, object, or role is an ordinary deny, so
/// `enforce` never yields `NotFound`. Repository failures wrap the
/// underlying cause and must not be collapsed into a deny.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
