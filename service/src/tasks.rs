//! Task CRUD with uniform ownership checks.
//!
//! Every operation follows fetch -> decide -> act, strictly in that order
//! within one request. The final store statement is conditioned on the
//! owner observed at fetch time, so a concurrent reassignment makes the
//! mutation miss instead of acting on somebody else's row.
//!
//! Two denial shapes are used consistently: a policy denial (the caller is
//! known but not entitled) is [`ServiceError::Forbidden`]; a task that
//! does not exist under the owner scope named in the request is
//! [`ServiceError::NotFound`], so probing foreign scopes never confirms
//! that a task exists.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use authz::{decide, Action, Principal};
use storage::{Task, TaskStatus, TaskStore};

use crate::error::{denial_for, Result, ServiceError};

/// Task changes; `None` means "leave unchanged".
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
}

impl TaskUpdate {
    fn is_empty(&self) -> bool {
        self.description.is_none() && self.status.is_none()
    }
}

pub struct TaskService {
    tasks: Arc<dyn TaskStore>,
}

impl TaskService {
    pub fn new(tasks: Arc<dyn TaskStore>) -> Self {
        Self { tasks }
    }

    /// Create a task under `owner_id`.
    ///
    /// The task does not exist yet to supply an owner, so the decision
    /// runs against the requested owner before any store access: a regular
    /// caller may only create under their own id. A missing owner account
    /// surfaces as [`ServiceError::NotFound`] from the store.
    pub async fn create(
        &self,
        caller: &Principal,
        owner_id: Uuid,
        description: String,
    ) -> Result<Task> {
        if !decide(caller, Some(owner_id), Action::Create).is_allowed() {
            return Err(denial_for(caller));
        }

        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            owner_id,
            description,
            status: TaskStatus::Todo,
            created_at: now,
            updated_at: now,
        };

        self.tasks.create(&task).await?;

        info!(task_id = %task.id, owner_id = %owner_id, "task created");
        Ok(task)
    }

    /// Fetch the task and verify it lives under `owner_scope` before the
    /// policy check runs; a scope mismatch is a plain NotFound.
    async fn fetch_scoped(&self, owner_scope: Uuid, task_id: Uuid) -> Result<Task> {
        let task = self.tasks.get_by_id(task_id).await?;
        if task.owner_id != owner_scope {
            return Err(ServiceError::NotFound);
        }
        Ok(task)
    }

    pub async fn get(&self, caller: &Principal, owner_scope: Uuid, task_id: Uuid) -> Result<Task> {
        let task = self.fetch_scoped(owner_scope, task_id).await?;
        if !decide(caller, Some(task.owner_id), Action::Read).is_allowed() {
            return Err(denial_for(caller));
        }
        Ok(task)
    }

    pub async fn list(
        &self,
        caller: &Principal,
        owner_id: Uuid,
        status: Option<TaskStatus>,
    ) -> Result<Vec<Task>> {
        if !decide(caller, Some(owner_id), Action::List).is_allowed() {
            return Err(denial_for(caller));
        }
        Ok(self.tasks.list_by_owner(owner_id, status).await?)
    }

    pub async fn update(
        &self,
        caller: &Principal,
        owner_scope: Uuid,
        task_id: Uuid,
        changes: TaskUpdate,
    ) -> Result<Task> {
        let mut task = self.fetch_scoped(owner_scope, task_id).await?;
        if !decide(caller, Some(task.owner_id), Action::Update).is_allowed() {
            return Err(denial_for(caller));
        }
        if changes.is_empty() {
            return Err(ServiceError::Validation("no fields to update".to_string()));
        }

        if let Some(description) = changes.description {
            task.description = description;
        }
        if let Some(status) = changes.status {
            task.status = status;
        }
        task.updated_at = Utc::now();

        self.tasks.update(&task).await?;

        info!(task_id = %task.id, "task updated");
        Ok(task)
    }

    pub async fn delete(
        &self,
        caller: &Principal,
        owner_scope: Uuid,
        task_id: Uuid,
    ) -> Result<()> {
        let task = self.fetch_scoped(owner_scope, task_id).await?;
        if !decide(caller, Some(task.owner_id), Action::Delete).is_allowed() {
            return Err(denial_for(caller));
        }

        self.tasks.delete(task.id, task.owner_id).await?;

        info!(task_id = %task_id, "task deleted");
        Ok(())
    }
}
