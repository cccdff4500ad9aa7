//! Resend Verification Use Case
//!
//! Re-issues the email-verification token for an unverified account. The
//! previous token is discarded the moment the new one is stored.

use std::sync::Arc;

use crate::application::mailer::AccountMailer;
use crate::domain::repository::AccountRepository;
use crate::domain::value_object::email::Email;
use crate::error::{AccountsError, AccountsResult};

/// Resend verification output
pub struct ResendVerificationOutput {
    pub email: String,
}

/// Resend verification use case
pub struct ResendVerificationUseCase<R, M>
where
    R: AccountRepository,
    M: AccountMailer,
{
    repo: Arc<R>,
    mailer: Arc<M>,
}

impl<R, M> ResendVerificationUseCase<R, M>
where
    R: AccountRepository,
    M: AccountMailer,
{
    pub fn new(repo: Arc<R>, mailer: Arc<M>) -> Self {
        Self { repo, mailer }
    }

    pub async fn execute(&self, email: &str) -> AccountsResult<ResendVerificationOutput> {
        let email = Email::new(email).map_err(|e| AccountsError::Validation(e.message().to_string()))?;

        let mut account = self
            .repo
            .find_by_email(&email)
            .await?
            .ok_or(AccountsError::AccountNotFound)?;

        if account.email_verified {
            return Err(AccountsError::AlreadyVerified);
        }

        let token = account.issue_verification_token(chrono::Utc::now());
        self.repo.update(&account).await?;

        self.mailer
            .send_verification(&account.email, account.user_name.original(), token.value())
            .await
            .map_err(|e| {
                AccountsError::Internal(format!("Failed to send verification email: {e}"))
            })?;

        tracing::info!(
            public_id = %account.public_id,
            "Verification email re-sent"
        );

        Ok(ResendVerificationOutput {
            email: account.email.as_str().to_string(),
        })
    }
}
