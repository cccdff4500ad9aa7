//! Register Use Case
//!
//! Creates a new account and starts the email-verification flow. The account
//! stays inactive until the verification token is consumed.

use std::sync::Arc;

use platform::credential::PasswordCredentialCodec;

use crate::application::config::AccountsConfig;
use crate::application::mailer::AccountMailer;
use crate::domain::entity::account::Account;
use crate::domain::repository::AccountRepository;
use crate::domain::value_object::{
    email::Email,
    password::{RawPassword, StoredPassword},
    user_name::UserName,
};
use crate::error::{AccountsError, AccountsResult};

/// Register input
pub struct RegisterInput {
    pub user_name: String,
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
}

/// Register output
pub struct RegisterOutput {
    pub public_id: String,
    pub email: String,
}

/// Register use case
pub struct RegisterUseCase<R, M>
where
    R: AccountRepository,
    M: AccountMailer + Send + Sync + 'static,
{
    repo: Arc<R>,
    mailer: Arc<M>,
    config: Arc<AccountsConfig>,
}

impl<R, M> RegisterUseCase<R, M>
where
    R: AccountRepository,
    M: AccountMailer + Send + Sync + 'static,
{
    pub fn new(repo: Arc<R>, mailer: Arc<M>, config: Arc<AccountsConfig>) -> Self {
        Self {
            repo,
            mailer,
            config,
        }
    }

    pub async fn execute(&self, input: RegisterInput) -> AccountsResult<RegisterOutput> {
        // Validate identity fields
        let email = Email::new(input.email)
            .map_err(|e| AccountsError::Validation(e.message().to_string()))?;
        let user_name =
            UserName::new(input.user_name).map_err(|e| AccountsError::Validation(e.to_string()))?;

        // Uniqueness checks
        if self.repo.exists_by_email(&email).await? {
            return Err(AccountsError::EmailTaken);
        }
        if self.repo.exists_by_user_name(&user_name).await? {
            return Err(AccountsError::UserNameTaken);
        }

        // Validate and hash the password. Derivation is memory-hard and
        // long-running, so it runs on the blocking pool, never on the
        // request dispatch thread.
        let raw_password = RawPassword::new(input.password)
            .map_err(|e| AccountsError::PasswordValidation(e.to_string()))?;

        let codec = PasswordCredentialCodec::new(self.config.credential_params);
        let password = tokio::task::spawn_blocking(move || {
            StoredPassword::from_raw(&codec, &raw_password)
        })
        .await
        .map_err(|e| AccountsError::Internal(format!("Hashing task failed: {e}")))??;

        // Create the account (inactive) with a live verification token
        let mut account = Account::register(user_name, email, input.display_name, password);
        let token = account.issue_verification_token(chrono::Utc::now());

        self.repo.create(&account).await?;

        tracing::info!(
            public_id = %account.public_id,
            user_name = %account.user_name,
            "Account registered, verification pending"
        );

        // Deliver the verification mail off the response path; a delivery
        // failure is logged, never surfaced to the registrant.
        let mailer = self.mailer.clone();
        let recipient = account.email.clone();
        let recipient_name = account.user_name.original().to_string();
        tokio::spawn(async move {
            if let Err(e) = mailer
                .send_verification(&recipient, &recipient_name, token.value())
                .await
            {
                tracing::error!(error = %e, "Failed to send verification email");
            }
        });

        Ok(RegisterOutput {
            public_id: account.public_id.to_string(),
            email: account.email.as_str().to_string(),
        })
    }
}
