//! Credential primitives: secret hashing and signed bearer tokens.
//!
//! Everything here is stateless per call; the only long-lived state is the
//! read-only signing secret inside [`TokenAuthority`], injected at
//! construction. Plaintext secrets are never logged by this crate.

pub mod error;
pub mod hasher;
pub mod token;

pub use error::{AuthnError, Result, VerifyError};
pub use hasher::{hash_secret, verify_secret};
pub use token::{Claims, IssuedToken, TokenAuthority, TOKEN_TTL_HOURS};
