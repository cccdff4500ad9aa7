//! Verify Email Use Case
//!
//! Consumes an email-verification token. Success flips `email_verified` and
//! `active` and clears the token in the same atomic step the store performs,
//! so a token can never be consumed twice.

use std::sync::Arc;

use crate::application::mailer::AccountMailer;
use crate::domain::repository::AccountRepository;
use crate::error::{AccountsError, AccountsResult};

/// Verify email output
pub struct VerifyEmailOutput {
    pub public_id: String,
    pub email: String,
}

/// Verify email use case
pub struct VerifyEmailUseCase<R, M>
where
    R: AccountRepository,
    M: AccountMailer + Send + Sync + 'static,
{
    repo: Arc<R>,
    mailer: Arc<M>,
}

impl<R, M> VerifyEmailUseCase<R, M>
where
    R: AccountRepository,
    M: AccountMailer + Send + Sync + 'static,
{
    pub fn new(repo: Arc<R>, mailer: Arc<M>) -> Self {
        Self { repo, mailer }
    }

    pub async fn execute(&self, token: &str) -> AccountsResult<VerifyEmailOutput> {
        let account = self
            .repo
            .consume_verification_token(token, chrono::Utc::now())
            .await?
            .ok_or(AccountsError::TokenNotFoundOrExpired)?;

        tracing::info!(
            public_id = %account.public_id,
            "Email verified, account activated"
        );

        // Welcome mail is a courtesy; failures stay out of the response
        let mailer = self.mailer.clone();
        let recipient = account.email.clone();
        let recipient_name = account.user_name.original().to_string();
        tokio::spawn(async move {
            if let Err(e) = mailer.send_welcome(&recipient, &recipient_name).await {
                tracing::error!(error = %e, "Failed to send welcome email");
            }
        });

        Ok(VerifyEmailOutput {
            public_id: account.public_id.to_string(),
            email: account.email.as_str().to_string(),
        })
    }
}
