//! Ownership-based authorization for the task-tracking API.
//!
//! This crate provides the access decision procedure applied before every
//! read or mutation of owned data. It defines the core authorization types
//! ([`Principal`], [`Role`], [`Action`]) and the pure [`decide`] function
//! that combines role and ownership into an allow/deny decision.
//!
//! # Authorization flow
//!
//! 1. **Request arrives** at the API layer
//! 2. **Principal resolver** verifies the bearer credential
//! 3. **Service layer** loads the target resource's owner
//! 4. **[`decide`]** evaluates (principal, owner, action)
//! 5. **Decision** is enforced: Allow continues, Deny maps to 403
//!
//! The model is a fixed two-role scheme: admins may act on any owner's
//! data, regular accounts only on their own, anonymous requests are denied
//! everything. Role *changes* are guarded separately by
//! [`permits_role_change`] because ownership alone must never be enough to
//! grant admin.
//!
//! Decisions are computed locally and fail closed: any missing context
//! value (no principal, no known owner) denies. Nothing in this crate
//! performs I/O.

pub mod types;

use tracing::debug;
use uuid::Uuid;

pub use types::{Action, Principal, Role};

/// The outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Decide whether `principal` may perform `action` on data owned by
/// `resource_owner`.
///
/// Rules, in order:
///
/// 1. Anonymous principals are denied every operation.
/// 2. Admins are allowed every operation (role changes are additionally
///    gated by [`permits_role_change`]).
/// 3. Regular principals are allowed only when `resource_owner` is present
///    and equals their own account id.
///
/// The owner must already be loaded by the caller; this function never
/// touches storage.
pub fn decide(principal: &Principal, resource_owner: Option<Uuid>, action: Action) -> Decision {
    let decision = match principal {
        Principal::Anonymous => Decision::Deny,
        Principal::Authenticated {
            role: Role::Admin, ..
        } => Decision::Allow,
        Principal::Authenticated {
            id,
            role: Role::Regular,
        } => match resource_owner {
            Some(owner) if owner == *id => Decision::Allow,
            _ => Decision::Deny,
        },
    };

    debug!(
        action = action.as_str(),
        ?principal,
        ?resource_owner,
        ?decision,
        "authorization decision"
    );

    decision
}

/// Whether `principal` may set an account's role to `requested`.
///
/// Layered on top of [`decide`]: an ownership match is not sufficient to
/// grant admin, so a regular caller may never request [`Role::Admin`],
/// not even on their own account. Admins may assign any role, including
/// elevating themselves.
pub fn permits_role_change(principal: &Principal, requested: Role) -> bool {
    match requested {
        Role::Regular => true,
        Role::Admin => principal.is_admin(),
    }
}
