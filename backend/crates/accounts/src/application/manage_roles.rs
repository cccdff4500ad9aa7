//! Role Management Use Case
//!
//! Assigns and queries account roles. The one hard rule: the service never
//! lets the last administrator be demoted.

use std::sync::Arc;

use crate::domain::entity::account::Account;
use crate::domain::repository::AccountRepository;
use crate::domain::value_object::{public_id::PublicId, role::AccountRole};
use crate::error::{AccountsError, AccountsResult};

/// Role management use case
pub struct ManageRolesUseCase<R>
where
    R: AccountRepository,
{
    repo: Arc<R>,
}

impl<R> ManageRolesUseCase<R>
where
    R: AccountRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Assign a role to an account
    pub async fn assign_role(&self, public_id: &str, role: &str) -> AccountsResult<Account> {
        let role = AccountRole::from_code(role.trim().to_lowercase().as_str())
            .ok_or_else(|| AccountsError::UnknownRole(role.to_string()))?;

        let public_id = PublicId::parse_str(public_id)
            .map_err(|e| AccountsError::Validation(e.message().to_string()))?;

        let mut account = self
            .repo
            .find_by_public_id(&public_id)
            .await?
            .ok_or(AccountsError::AccountNotFound)?;

        if account.role == role {
            return Ok(account);
        }

        // Demoting an admin must leave at least one admin behind
        if account.role.is_admin() && !role.is_admin() {
            let admin_count = self.repo.count_by_role(AccountRole::Admin).await?;
            if admin_count <= 1 {
                return Err(AccountsError::LastAdministrator);
            }
        }

        account.set_role(role);
        self.repo.update(&account).await?;

        tracing::info!(
            public_id = %account.public_id,
            role = %account.role,
            "Account role updated"
        );

        Ok(account)
    }

    /// Get the role of an account
    pub async fn role_of(&self, public_id: &str) -> AccountsResult<AccountRole> {
        let public_id = PublicId::parse_str(public_id)
            .map_err(|e| AccountsError::Validation(e.message().to_string()))?;

        let account = self
            .repo
            .find_by_public_id(&public_id)
            .await?
            .ok_or(AccountsError::AccountNotFound)?;

        Ok(account.role)
    }

    /// List accounts holding a role
    pub async fn accounts_in_role(&self, role: &str) -> AccountsResult<Vec<Account>> {
        let role = AccountRole::from_code(role.trim().to_lowercase().as_str())
            .ok_or_else(|| AccountsError::UnknownRole(role.to_string()))?;

        self.repo.list_by_role(role).await
    }
}
