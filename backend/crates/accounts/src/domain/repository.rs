//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.

use chrono::{DateTime, Utc};

use crate::domain::entity::account::Account;
use crate::domain::value_object::{
    account_id::AccountId, email::Email, public_id::PublicId, role::AccountRole,
    user_name::UserName,
};
use crate::error::AccountsResult;

/// Account repository trait
#[trait_variant::make(AccountRepository: Send)]
pub trait LocalAccountRepository {
    /// Create a new account
    async fn create(&self, account: &Account) -> AccountsResult<()>;

    /// Find account by ID
    async fn find_by_id(&self, account_id: &AccountId) -> AccountsResult<Option<Account>>;

    /// Find account by public ID
    async fn find_by_public_id(&self, public_id: &PublicId) -> AccountsResult<Option<Account>>;

    /// Find account by email
    async fn find_by_email(&self, email: &Email) -> AccountsResult<Option<Account>>;

    /// Find account by user name
    async fn find_by_user_name(&self, user_name: &UserName) -> AccountsResult<Option<Account>>;

    /// Check if email exists
    async fn exists_by_email(&self, email: &Email) -> AccountsResult<bool>;

    /// Check if user name exists
    async fn exists_by_user_name(&self, user_name: &UserName) -> AccountsResult<bool>;

    /// Update account
    async fn update(&self, account: &Account) -> AccountsResult<()>;

    /// Consume a live email-verification token
    ///
    /// Must atomically match the exact token string against an unexpired
    /// slot, apply the verification transition (`email_verified = true`,
    /// `active = true`), and clear the slot — as one read-modify-write, so
    /// two concurrent consumptions of the same token cannot both succeed.
    /// Returns the account after the transition, or `None` when no account
    /// holds this token unexpired.
    async fn consume_verification_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> AccountsResult<Option<Account>>;

    /// Consume a live password-reset token
    ///
    /// Same at-most-once contract as verification consumption; only the
    /// token slot is cleared (the caller stores the new credential
    /// afterwards).
    async fn consume_reset_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> AccountsResult<Option<Account>>;

    /// Count accounts holding a role
    async fn count_by_role(&self, role: AccountRole) -> AccountsResult<i64>;

    /// List accounts holding a role
    async fn list_by_role(&self, role: AccountRole) -> AccountsResult<Vec<Account>>;
}
