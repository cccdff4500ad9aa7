//! Password Reset Use Cases
//!
//! Two halves of the reset flow. ForgotPassword issues a short-lived reset
//! token and answers identically whether or not the email exists, so the
//! endpoint cannot be used to enumerate accounts. ResetPassword consumes the
//! token and stores a freshly derived credential.

use std::sync::Arc;

use platform::credential::PasswordCredentialCodec;

use crate::application::config::AccountsConfig;
use crate::application::mailer::AccountMailer;
use crate::domain::repository::AccountRepository;
use crate::domain::value_object::{
    email::Email,
    password::{RawPassword, StoredPassword},
};
use crate::error::{AccountsError, AccountsResult};

// ============================================================================
// Forgot Password
// ============================================================================

/// Forgot password output
///
/// Deliberately carries nothing that depends on whether the account exists.
pub struct ForgotPasswordOutput {
    pub email: String,
}

/// Forgot password use case
pub struct ForgotPasswordUseCase<R, M>
where
    R: AccountRepository,
    M: AccountMailer,
{
    repo: Arc<R>,
    mailer: Arc<M>,
}

impl<R, M> ForgotPasswordUseCase<R, M>
where
    R: AccountRepository,
    M: AccountMailer,
{
    pub fn new(repo: Arc<R>, mailer: Arc<M>) -> Self {
        Self { repo, mailer }
    }

    pub async fn execute(&self, email: &str) -> AccountsResult<ForgotPasswordOutput> {
        let output = ForgotPasswordOutput {
            email: email.to_string(),
        };

        // A malformed or unknown email gets the same response as a hit
        let Ok(parsed) = Email::new(email) else {
            return Ok(output);
        };
        let Some(mut account) = self.repo.find_by_email(&parsed).await? else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(output);
        };

        let token = account.issue_reset_token(chrono::Utc::now());
        self.repo.update(&account).await?;

        if let Err(e) = self
            .mailer
            .send_password_reset(&account.email, account.user_name.original(), token.value())
            .await
        {
            // Keep the uniform response even when delivery fails
            tracing::error!(error = %e, "Failed to send password reset email");
        } else {
            tracing::info!(
                public_id = %account.public_id,
                "Password reset email sent"
            );
        }

        Ok(output)
    }
}

// ============================================================================
// Reset Password
// ============================================================================

/// Reset password input
pub struct ResetPasswordInput {
    pub token: String,
    pub new_password: String,
}

/// Reset password output
pub struct ResetPasswordOutput {
    pub email: String,
}

/// Reset password use case
pub struct ResetPasswordUseCase<R>
where
    R: AccountRepository,
{
    repo: Arc<R>,
    config: Arc<AccountsConfig>,
}

impl<R> ResetPasswordUseCase<R>
where
    R: AccountRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AccountsConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn execute(&self, input: ResetPasswordInput) -> AccountsResult<ResetPasswordOutput> {
        // Validate the replacement password before spending the token
        let raw_password = RawPassword::new(input.new_password)
            .map_err(|e| AccountsError::PasswordValidation(e.to_string()))?;

        // Consuming clears the token slot atomically with the match; proving
        // token validity is all it does, the credential swap follows here.
        let mut account = self
            .repo
            .consume_reset_token(&input.token, chrono::Utc::now())
            .await?
            .ok_or(AccountsError::TokenNotFoundOrExpired)?;

        let codec = PasswordCredentialCodec::new(self.config.credential_params);
        let password = tokio::task::spawn_blocking(move || {
            StoredPassword::from_raw(&codec, &raw_password)
        })
        .await
        .map_err(|e| AccountsError::Internal(format!("Hashing task failed: {e}")))??;

        account.set_password(password);
        self.repo.update(&account).await?;

        tracing::info!(
            public_id = %account.public_id,
            "Password reset completed"
        );

        Ok(ResetPasswordOutput {
            email: account.email.as_str().to_string(),
        })
    }
}
