use thiserror::Error;

/// Internal failures of the credential primitives. These never describe a
/// bad secret or a bad token; those cases are ordinary return values.
#[derive(Error, Debug)]
pub enum AuthnError {
    #[error("hashing failure: {0}")]
    Hashing(String),

    #[error("signing failure: {0}")]
    Signing(String),
}

/// Why a presented token was rejected. Callers must treat both causes
/// identically (reject); they are distinguished for logging only.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyError {
    #[error("bad signature")]
    BadSignature,

    #[error("token expired")]
    Expired,
}

pub type Result<T> = std::result::Result<T, AuthnError>;
