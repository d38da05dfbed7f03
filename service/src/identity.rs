//! Account lifecycle: registration, authentication, profile changes.
//!
//! An account moves `non-existent -> active` (register), may change in
//! place (update), and ends at `deleted`; there is no reactivation. Every
//! operation takes the caller's [`Principal`] explicitly so the
//! authorization dependency is visible at each call site.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use authn::TokenAuthority;
use authz::{decide, permits_role_change, Action, Principal, Role};
use storage::{Account, AccountStore, StorageError};

use crate::error::{denial_for, Result, ServiceError};

/// Registration input. Shape validation (email format, secret length)
/// happens at the boundary before this type is constructed.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub secret: String,
    /// Defaults to [`Role::Regular`]. Requesting [`Role::Admin`] requires
    /// an admin caller.
    pub role: Option<Role>,
}

/// Profile changes. Presence is expressed by `Option`, never by empty
/// strings: `None` always means "leave unchanged".
#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    pub email: Option<String>,
    pub secret: Option<String>,
    pub role: Option<Role>,
}

impl AccountUpdate {
    fn is_empty(&self) -> bool {
        self.email.is_none() && self.secret.is_none() && self.role.is_none()
    }
}

/// The result of a successful authentication.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub account_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

pub struct IdentityService {
    accounts: Arc<dyn AccountStore>,
    tokens: Arc<TokenAuthority>,
}

impl IdentityService {
    pub fn new(accounts: Arc<dyn AccountStore>, tokens: Arc<TokenAuthority>) -> Self {
        Self { accounts, tokens }
    }

    /// Register a new account.
    ///
    /// Anonymous and regular callers may only create regular accounts;
    /// the escalation guard rejects an admin request before any hashing
    /// or storage work happens.
    pub async fn register(&self, caller: &Principal, data: NewAccount) -> Result<Account> {
        let role = data.role.unwrap_or(Role::Regular);
        if !permits_role_change(caller, role) {
            return Err(ServiceError::Forbidden);
        }

        let secret = data.secret;
        let password_hash =
            tokio::task::spawn_blocking(move || authn::hash_secret(&secret)).await??;

        let account = Account {
            id: Uuid::new_v4(),
            email: data.email,
            password_hash,
            role,
            created_at: Utc::now(),
        };

        self.accounts.create(&account).await?;

        info!(account_id = %account.id, role = role.as_str(), "account registered");
        Ok(account)
    }

    /// Verify an email/secret pair and issue a bearer token carrying the
    /// account's current role.
    ///
    /// "No such email" and "wrong secret" are indistinguishable to the
    /// caller; both are [`ServiceError::InvalidCredentials`].
    pub async fn authenticate(&self, email: &str, secret: &str) -> Result<AuthSession> {
        let account = match self.accounts.get_by_email(email).await {
            Ok(account) => account,
            Err(StorageError::NotFound) => return Err(ServiceError::InvalidCredentials),
            Err(e) => return Err(e.into()),
        };

        let stored = account.password_hash.clone();
        let secret = secret.to_string();
        let verified =
            tokio::task::spawn_blocking(move || authn::verify_secret(&secret, &stored)).await??;

        if !verified {
            return Err(ServiceError::InvalidCredentials);
        }

        let issued = self.tokens.issue(account.id, account.role, Utc::now())?;

        info!(account_id = %account.id, "authentication succeeded");
        Ok(AuthSession {
            token: issued.token,
            account_id: account.id,
            expires_at: issued.expires_at,
        })
    }

    pub async fn get_account(&self, caller: &Principal, target_id: Uuid) -> Result<Account> {
        if !decide(caller, Some(target_id), Action::Read).is_allowed() {
            return Err(denial_for(caller));
        }
        Ok(self.accounts.get_by_id(target_id).await?)
    }

    /// List every account. Admin only: a regular caller has no owner match
    /// for the collection as a whole.
    pub async fn list_accounts(&self, caller: &Principal) -> Result<Vec<Account>> {
        if !decide(caller, None, Action::List).is_allowed() {
            return Err(denial_for(caller));
        }
        Ok(self.accounts.list().await?)
    }

    /// Apply profile changes to `target_id`.
    ///
    /// Ownership is checked first; a role change is additionally gated by
    /// the escalation guard, so a regular caller cannot grant themselves
    /// admin even on their own account.
    pub async fn update_account(
        &self,
        caller: &Principal,
        target_id: Uuid,
        changes: AccountUpdate,
    ) -> Result<Account> {
        if !decide(caller, Some(target_id), Action::Update).is_allowed() {
            return Err(denial_for(caller));
        }
        if let Some(role) = changes.role {
            if !permits_role_change(caller, role) {
                return Err(ServiceError::Forbidden);
            }
        }
        if changes.is_empty() {
            return Err(ServiceError::Validation("no fields to update".to_string()));
        }

        let mut account = self.accounts.get_by_id(target_id).await?;

        if let Some(email) = changes.email {
            account.email = email;
        }
        if let Some(role) = changes.role {
            account.role = role;
        }
        if let Some(secret) = changes.secret {
            account.password_hash =
                tokio::task::spawn_blocking(move || authn::hash_secret(&secret)).await??;
        }

        self.accounts.update(&account).await?;

        info!(account_id = %account.id, "account updated");
        Ok(account)
    }

    /// Delete `target_id` and, through the store's referential-integrity
    /// policy, every task it owns.
    pub async fn delete_account(&self, caller: &Principal, target_id: Uuid) -> Result<()> {
        if !decide(caller, Some(target_id), Action::Delete).is_allowed() {
            return Err(denial_for(caller));
        }

        self.accounts.delete(target_id).await?;

        info!(account_id = %target_id, "account deleted");
        Ok(())
    }
}
