use thiserror::Error;

/// Errors surfaced to the HTTP layer.
///
/// Validation never stops at the first problem: `InvalidRequest` carries
/// every message collected for the call.
#[derive(Debug, Error)]
pub enum AqsError {
    #[error("invalid request: {}", .0.join("; "))]
    InvalidRequest(Vec<String>),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("internal error: {0}")]
    Internal(String),
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type AqsResult<T> = Result<T, AqsError>;

impl AqsError {
    pub fn invalid(message: impl Into<String>) -> Self {
        AqsError::InvalidRequest(vec![message.into()])
    }

    /// Messages carried by an `InvalidRequest`, empty for other kinds.
    pub fn messages(&self) -> &[String] {
        match self {
            AqsError::InvalidRequest(errors) => errors,
            _ => &[],
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            AqsError::InvalidRequest(_) => "invalid_request",
            AqsError::NotFound(_) => "not_found",
            AqsError::Internal(_) => "internal_error",
            AqsError::Backend(_) => "server_error",
        }
    }
}

/// Fail with every accumulated message, or succeed when there are none.
pub(crate) fn fail_if_any(errors: Vec<String>) -> AqsResult<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AqsError::InvalidRequest(errors))
    }
}
