//! SQLite-backed persistence for accounts and tasks.
//!
//! All durable state of the system lives behind the [`AccountStore`] and
//! [`TaskStore`] traits. The stores resolve their own races: email
//! uniqueness is a database constraint surfaced as
//! [`StorageError::Conflict`], and conditional updates that match zero
//! rows surface as [`StorageError::NotFound`]. Referential integrity
//! between tasks and their owning accounts is enforced here (foreign key
//! with cascade delete), not in the service layer.

pub mod accounts;
pub mod db;
pub mod error;
pub mod models;
pub mod tasks;

pub use accounts::{AccountStore, SqliteAccountStore};
pub use db::{Database, DatabaseConfig};
pub use error::{Result, StorageError};
pub use models::{Account, Task, TaskStatus};
pub use tasks::{SqliteTaskStore, TaskStore};
