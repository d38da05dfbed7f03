//! Core authorization types shared across the workspace.
//!
//! A [`Principal`] is derived fresh from each verified credential and lives
//! only for the duration of a request. It must never be constructed from
//! untrusted data: the only production code paths that build an
//! authenticated principal are the token verifier and the tests.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account role. The authorization model is a fixed two-role scheme;
/// there is deliberately no room for custom roles here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Regular,
    Admin,
}

impl Role {
    /// Stable string form used for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Regular => "regular",
            Role::Admin => "admin",
        }
    }

    /// Parse the database string form. Returns `None` for anything else.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "regular" => Some(Role::Regular),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// The identity attached to a request after credential verification,
/// or [`Principal::Anonymous`] when no credential was presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Principal {
    Anonymous,
    Authenticated { id: Uuid, role: Role },
}

impl Principal {
    /// Build an authenticated principal from verified claims.
    pub fn authenticated(id: Uuid, role: Role) -> Self {
        Principal::Authenticated { id, role }
    }

    pub fn is_admin(&self) -> bool {
        matches!(
            self,
            Principal::Authenticated {
                role: Role::Admin,
                ..
            }
        )
    }

    /// The account id of an authenticated principal, `None` for anonymous.
    pub fn account_id(&self) -> Option<Uuid> {
        match self {
            Principal::Anonymous => None,
            Principal::Authenticated { id, .. } => Some(*id),
        }
    }
}

/// The operation being authorized. Used for decision logging and to keep
/// call sites self-describing; the decision itself does not vary by action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
    List,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::List => "list",
        }
    }
}
