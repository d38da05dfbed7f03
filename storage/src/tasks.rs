//! Task persistence.
//!
//! Updates and deletes are single conditional statements keyed on both the
//! task id and the owner observed at fetch time, so an ownership check and
//! the mutation it guards cannot be split by a concurrent reassignment:
//! if the row changed hands in between, the statement matches zero rows
//! and reports [`StorageError::NotFound`].

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::{Task, TaskStatus};

/// Storage capability for tasks.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Insert a new task. A missing owner account is reported as
    /// [`StorageError::NotFound`], distinct from a database failure.
    async fn create(&self, task: &Task) -> Result<()>;
    async fn get_by_id(&self, id: Uuid) -> Result<Task>;
    async fn list_by_owner(&self, owner_id: Uuid, status: Option<TaskStatus>)
        -> Result<Vec<Task>>;
    /// Conditional write: matches only a row still owned by `task.owner_id`.
    async fn update(&self, task: &Task) -> Result<()>;
    /// Conditional delete, keyed the same way as [`TaskStore::update`].
    async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<()>;
}

pub struct SqliteTaskStore {
    pool: SqlitePool,
}

impl SqliteTaskStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn task_from_row(row: &SqliteRow) -> Result<Task> {
    let id: String = row.try_get("id")?;
    let owner_id: String = row.try_get("owner_id")?;
    let status: String = row.try_get("status")?;

    Ok(Task {
        id: Uuid::parse_str(&id).map_err(|e| StorageError::Corrupt(format!("task id: {}", e)))?,
        owner_id: Uuid::parse_str(&owner_id)
            .map_err(|e| StorageError::Corrupt(format!("task owner id: {}", e)))?,
        description: row.try_get("description")?,
        status: TaskStatus::parse(&status)
            .ok_or_else(|| StorageError::Corrupt(format!("unknown status: {}", status)))?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn not_found_on_missing_owner(e: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(ref db) = e {
        if db.is_foreign_key_violation() {
            return StorageError::NotFound;
        }
    }
    StorageError::Database(e)
}

#[async_trait]
impl TaskStore for SqliteTaskStore {
    async fn create(&self, task: &Task) -> Result<()> {
        sqlx::query(
            "INSERT INTO tasks (id, owner_id, description, status, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(task.id.to_string())
        .bind(task.owner_id.to_string())
        .bind(&task.description)
        .bind(task.status.as_str())
        .bind(task.created_at)
        .bind(task.updated_at)
        .execute(&self.pool)
        .await
        .map_err(not_found_on_missing_owner)?;

        debug!(task_id = %task.id, owner_id = %task.owner_id, "task created");
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Task> {
        let row = sqlx::query(
            "SELECT id, owner_id, description, status, created_at, updated_at \
             FROM tasks WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        task_from_row(&row)
    }

    async fn list_by_owner(
        &self,
        owner_id: Uuid,
        status: Option<TaskStatus>,
    ) -> Result<Vec<Task>> {
        let rows = match status {
            Some(status) => {
                sqlx::query(
                    "SELECT id, owner_id, description, status, created_at, updated_at \
                     FROM tasks WHERE owner_id = ? AND status = ? ORDER BY created_at, id",
                )
                .bind(owner_id.to_string())
                .bind(status.as_str())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT id, owner_id, description, status, created_at, updated_at \
                     FROM tasks WHERE owner_id = ? ORDER BY created_at, id",
                )
                .bind(owner_id.to_string())
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.iter().map(task_from_row).collect()
    }

    async fn update(&self, task: &Task) -> Result<()> {
        let result = sqlx::query(
            "UPDATE tasks SET description = ?, status = ?, updated_at = ? \
             WHERE id = ? AND owner_id = ?",
        )
        .bind(&task.description)
        .bind(task.status.as_str())
        .bind(task.updated_at)
        .bind(task.id.to_string())
        .bind(task.owner_id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        debug!(task_id = %task.id, "task updated");
        Ok(())
    }

    async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ? AND owner_id = ?")
            .bind(id.to_string())
            .bind(owner_id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        debug!(task_id = %id, "task deleted");
        Ok(())
    }
}
