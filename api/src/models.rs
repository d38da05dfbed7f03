//! Request and response shapes for the HTTP surface.
//!
//! Response types carry only public fields; the password hash never leaves
//! the storage/service boundary. Input-shape validation happens here,
//! before anything touches a service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use authz::Role;
use storage::{Account, Task, TaskStatus};

use crate::error::{ApiError, ApiResult};

/// Registration request
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Successful login response
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Public account representation
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountResponse {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            email: account.email,
            role: account.role,
            created_at: account.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccountListResponse {
    pub users: Vec<AccountResponse>,
}

/// Profile update request; absent fields are left unchanged
#[derive(Debug, Deserialize, Default)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

/// Task creation request
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub description: String,
}

/// Task update request; absent fields are left unchanged
#[derive(Debug, Deserialize, Default)]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
}

/// Public task representation
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub description: String,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            owner_id: task.owner_id,
            description: task.description,
            status: task.status,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TaskListResponse {
    pub tasks: Vec<TaskResponse>,
}

/// Query parameters for task listing
#[derive(Debug, Deserialize, Default)]
pub struct TaskListQuery {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

/// An email needs non-empty text on both sides of a single `@`. Anything
/// more is the mail system's problem.
pub fn validate_email(email: &str) -> ApiResult<()> {
    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or_default();
    let domain = parts.next();

    match domain {
        Some(domain) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(ApiError::Validation("invalid email address".to_string())),
    }
}

pub fn validate_password(password: &str) -> ApiResult<()> {
    if password.chars().count() < 8 {
        return Err(ApiError::Validation(
            "password must be at least 8 characters".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_description(description: &str) -> ApiResult<()> {
    let length = description.chars().count();
    if !(10..=200).contains(&length) {
        return Err(ApiError::Validation(
            "description must be between 10 and 200 characters".to_string(),
        ));
    }
    Ok(())
}
