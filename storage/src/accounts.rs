//! Account persistence.

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use authz::Role;

use crate::error::{Result, StorageError};
use crate::models::Account;

/// Storage capability for accounts. Each call is a single atomic
/// statement; uniqueness and existence races are resolved by the database,
/// not by callers.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn create(&self, account: &Account) -> Result<()>;
    async fn get_by_id(&self, id: Uuid) -> Result<Account>;
    async fn get_by_email(&self, email: &str) -> Result<Account>;
    async fn list(&self) -> Result<Vec<Account>>;
    async fn update(&self, account: &Account) -> Result<()>;
    async fn delete(&self, id: Uuid) -> Result<()>;
}

pub struct SqliteAccountStore {
    pool: SqlitePool,
}

impl SqliteAccountStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn account_from_row(row: &SqliteRow) -> Result<Account> {
    let id: String = row.try_get("id")?;
    let role: String = row.try_get("role")?;

    Ok(Account {
        id: Uuid::parse_str(&id)
            .map_err(|e| StorageError::Corrupt(format!("account id: {}", e)))?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        role: Role::parse(&role)
            .ok_or_else(|| StorageError::Corrupt(format!("unknown role: {}", role)))?,
        created_at: row.try_get("created_at")?,
    })
}

fn conflict_on_unique(e: sqlx::Error, message: &str) -> StorageError {
    if let sqlx::Error::Database(ref db) = e {
        if db.is_unique_violation() {
            return StorageError::Conflict(message.to_string());
        }
    }
    StorageError::Database(e)
}

#[async_trait]
impl AccountStore for SqliteAccountStore {
    async fn create(&self, account: &Account) -> Result<()> {
        sqlx::query(
            "INSERT INTO accounts (id, email, password_hash, role, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(account.id.to_string())
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(account.role.as_str())
        .bind(account.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "email already registered"))?;

        debug!(account_id = %account.id, "account created");
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Account> {
        let row = sqlx::query(
            "SELECT id, email, password_hash, role, created_at FROM accounts WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        account_from_row(&row)
    }

    async fn get_by_email(&self, email: &str) -> Result<Account> {
        let row = sqlx::query(
            "SELECT id, email, password_hash, role, created_at FROM accounts WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        account_from_row(&row)
    }

    async fn list(&self) -> Result<Vec<Account>> {
        let rows = sqlx::query(
            "SELECT id, email, password_hash, role, created_at FROM accounts \
             ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(account_from_row).collect()
    }

    async fn update(&self, account: &Account) -> Result<()> {
        let result = sqlx::query(
            "UPDATE accounts SET email = ?, password_hash = ?, role = ? WHERE id = ?",
        )
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(account.role.as_str())
        .bind(account.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "email already registered"))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        debug!(account_id = %account.id, "account updated");
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        debug!(account_id = %id, "account deleted");
        Ok(())
    }
}
