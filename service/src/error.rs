use thiserror::Error;
use tracing::error;

use authn::AuthnError;
use storage::StorageError;

/// The error surface every service operation exposes to the boundary.
///
/// Internal causes (crypto failures, database failures, corrupt rows) are
/// collapsed into [`ServiceError::Internal`]; the detail is logged here and
/// never returned to a client.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    /// Covers both "no such account" and "wrong secret" so that login
    /// failures cannot be used to enumerate registered emails.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The operation requires an authenticated caller and none was
    /// presented.
    #[error("authentication required")]
    Unauthorized,

    #[error("permission denied")]
    Forbidden,

    #[error("not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("internal error")]
    Internal,
}

impl From<StorageError> for ServiceError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound => ServiceError::NotFound,
            StorageError::Conflict(message) => ServiceError::Conflict(message),
            StorageError::Corrupt(detail) => {
                error!("corrupt record: {}", detail);
                ServiceError::Internal
            }
            StorageError::Database(e) => {
                error!("storage failure: {}", e);
                ServiceError::Internal
            }
        }
    }
}

impl From<AuthnError> for ServiceError {
    fn from(e: AuthnError) -> Self {
        error!("credential primitive failure: {}", e);
        ServiceError::Internal
    }
}

impl From<tokio::task::JoinError> for ServiceError {
    fn from(e: tokio::task::JoinError) -> Self {
        error!("blocking task failure: {}", e);
        ServiceError::Internal
    }
}

/// The error shape for a denied operation: an anonymous caller is missing
/// a credential entirely, an authenticated one lacks the rights.
pub(crate) fn denial_for(caller: &authz::Principal) -> ServiceError {
    match caller {
        authz::Principal::Anonymous => ServiceError::Unauthorized,
        _ => ServiceError::Forbidden,
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
