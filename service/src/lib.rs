//! Service layer: orchestrates credential primitives, the access decision
//! procedure, and the stores into the operations the API boundary exposes.
//!
//! Every method takes the caller's [`authz::Principal`] as an explicit
//! parameter; there is no ambient request identity anywhere in this
//! workspace. Denials fail closed and internal failures are collapsed to
//! an opaque error before they leave this crate.

pub mod error;
pub mod identity;
pub mod tasks;

pub use error::{Result, ServiceError};
pub use identity::{AccountUpdate, AuthSession, IdentityService, NewAccount};
pub use tasks::{TaskService, TaskUpdate};
