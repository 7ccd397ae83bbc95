use thiserror::Error;

pub type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error taxonomy every layer maps into.
///
/// `Internal` carries detail for the logs; callers only ever see the
/// generic message.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing/invalid/expired credential, or refresh-token mismatch.
    #[error("{0}")]
    Unauthorized(String),
    /// Authenticated but not permitted.
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    /// Duplicate username/email/participant.
    #[error("{0}")]
    Conflict(String),
    /// Rejected before any repository access.
    #[error("{0}")]
    Validation(String),
    #[error("internal server error")]
    Internal(#[source] BoxedError),
}

impl ApiError {
    pub fn internal<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Internal(Box::new(err))
    }

    /// HTTP status this error surfaces as.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::Validation(_) => 400,
            Self::Internal(_) => 500,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
