//! Login Use Case
//!
//! Authenticates an account by email or user name and issues a signed
//! access token.

use std::sync::Arc;

use platform::credential::PasswordCredentialCodec;

use crate::application::access_token::issue_access_token;
use crate::application::config::AccountsConfig;
use crate::domain::entity::account::Account;
use crate::domain::repository::AccountRepository;
use crate::domain::value_object::{email::Email, password::RawPassword, user_name::UserName};
use crate::error::{AccountsError, AccountsResult};

/// Login input
pub struct LoginInput {
    /// User name or email
    pub identifier: String,
    /// Password
    pub password: String,
}

/// Login output
pub struct LoginOutput {
    pub access_token: String,
    pub expires_at_ms: i64,
    pub account: Account,
}

/// Login use case
pub struct LoginUseCase<R>
where
    R: AccountRepository,
{
    repo: Arc<R>,
    config: Arc<AccountsConfig>,
}

impl<R> LoginUseCase<R>
where
    R: AccountRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AccountsConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn execute(&self, input: LoginInput) -> AccountsResult<LoginOutput> {
        // Find account by email or user name
        let account = if input.identifier.contains('@') {
            let email =
                Email::new(&input.identifier).map_err(|_| AccountsError::InvalidCredentials)?;
            self.repo.find_by_email(&email).await?
        } else {
            let user_name =
                UserName::new(&input.identifier).map_err(|_| AccountsError::InvalidCredentials)?;
            self.repo.find_by_user_name(&user_name).await?
        };

        let mut account = account.ok_or(AccountsError::InvalidCredentials)?;

        // Unverified accounts cannot log in
        if !account.can_login() {
            return Err(AccountsError::AccountInactive);
        }

        // Verify password on the blocking pool (memory-hard derivation)
        let raw_password =
            RawPassword::new(input.password).map_err(|_| AccountsError::InvalidCredentials)?;

        let codec = PasswordCredentialCodec::new(self.config.credential_params);
        let stored = account.password.clone();
        let password_valid =
            tokio::task::spawn_blocking(move || stored.verify(&codec, &raw_password))
                .await
                .map_err(|e| AccountsError::Internal(format!("Verify task failed: {e}")))?;

        if !password_valid {
            return Err(AccountsError::InvalidCredentials);
        }

        account.record_login();
        self.repo.update(&account).await?;

        let (access_token, expires_at_ms) = issue_access_token(
            &self.config.access_token_secret,
            account.public_id.as_str(),
            self.config.access_token_ttl_ms(),
        );

        tracing::info!(
            public_id = %account.public_id,
            "Account logged in"
        );

        Ok(LoginOutput {
            access_token,
            expires_at_ms,
            account,
        })
    }
}
