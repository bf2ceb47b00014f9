use thiserror::Error;

/// Errors surfaced by the core services.
///
/// Ownership failures on alerts are deliberately reported as `NotFound` so
/// callers cannot probe for the existence of other users' alerts.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("missing or invalid field: {0}")]
    Validation(&'static str),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("alert already handled")]
    AlreadyHandled,

    #[error("upstream failure: {0}")]
    Upstream(String),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl CoreError {
    /// True for errors the caller caused (HTTP layer maps these to 4xx).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CoreError::Validation(_) | CoreError::NotFound(_) | CoreError::AlreadyHandled
        )
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
