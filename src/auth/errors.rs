use crate::auth::repo::StoreError;
use crate::rpc::{ErrorKind, RpcError};

/// Domain failures of the authentication service.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("User with this email already exists")]
    EmailTaken,

    /// Unknown email, inactive account and wrong password all collapse here.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => AuthError::EmailTaken,
            StoreError::Backend(e) => AuthError::Internal(e),
        }
    }
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Validation(_) => ErrorKind::Validation,
            AuthError::EmailTaken => ErrorKind::Conflict,
            AuthError::InvalidCredentials => ErrorKind::Unauthorized,
            AuthError::UserNotFound => ErrorKind::NotFound,
            AuthError::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<AuthError> for RpcError {
    fn from(err: AuthError) -> Self {
        // Display of Internal is generic; the cause stays in the logs
        RpcError::new(err.kind(), err.to_string())
    }
}
