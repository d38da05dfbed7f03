//! Issuing and verifying signed bearer tokens.
//!
//! A token is a self-contained HS256 JWT carrying the account id, its role
//! at issue time, and issue/expiry instants. There is no server-side token
//! record and no revocation list; a token dies only by expiry. The signing
//! secret is process-wide, loaded once at startup, and never rotated at
//! runtime (rotation would need a key-id claim this format does not carry).

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use authz::Role;

use crate::error::{AuthnError, Result, VerifyError};

/// Token lifetime. Fixed; clients refresh by re-authenticating.
pub const TOKEN_TTL_HOURS: i64 = 3;

/// The claims embedded in every issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account id the token was issued to.
    pub sub: Uuid,
    /// Role at issue time. A role change does not invalidate outstanding
    /// tokens; they keep the old role until expiry.
    pub role: Role,
    /// Issued-at, unix seconds.
    pub iat: i64,
    /// Expires-at, unix seconds.
    pub exp: i64,
}

/// A freshly issued token together with its expiry instant.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies tokens with a shared symmetric secret.
///
/// Construct once at startup and share read-only; verification is a pure
/// per-request computation with no other state.
pub struct TokenAuthority {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenAuthority {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the caller-supplied clock in verify(),
        // after the signature check, so the order and the clock are under
        // our control rather than the library's.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Issue a token for `account_id` with `role`, valid for
    /// [`TOKEN_TTL_HOURS`] from `now`.
    pub fn issue(&self, account_id: Uuid, role: Role, now: DateTime<Utc>) -> Result<IssuedToken> {
        let expires_at = now + Duration::hours(TOKEN_TTL_HOURS);
        let claims = Claims {
            sub: account_id,
            role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AuthnError::Signing(e.to_string()))?;

        debug!(account_id = %account_id, role = role.as_str(), "issued token");

        Ok(IssuedToken { token, expires_at })
    }

    /// Verify a presented token: signature integrity first, then expiry
    /// against `now`. Returns the embedded claims on success.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> std::result::Result<Claims, VerifyError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|_| VerifyError::BadSignature)?;

        if data.claims.exp <= now.timestamp() {
            return Err(VerifyError::Expired);
        }

        Ok(data.claims)
    }
}
