//! Development Mailer
//!
//! Delivery transport is an external collaborator; this implementation just
//! records the intent to the log so local flows can be exercised without an
//! SMTP relay. Token values never reach the log.

use crate::application::mailer::AccountMailer;
use crate::domain::value_object::email::Email;
use crate::error::AccountsResult;

/// Log-only mailer for development and tests
#[derive(Debug, Clone, Default)]
pub struct TracingMailer;

impl AccountMailer for TracingMailer {
    async fn send_verification(
        &self,
        email: &Email,
        user_name: &str,
        _token: &str,
    ) -> AccountsResult<()> {
        tracing::info!(
            recipient = %email,
            user_name = %user_name,
            "Verification email queued (development mailer)"
        );
        Ok(())
    }

    async fn send_password_reset(
        &self,
        email: &Email,
        user_name: &str,
        _token: &str,
    ) -> AccountsResult<()> {
        tracing::info!(
            recipient = %email,
            user_name = %user_name,
            "Password reset email queued (development mailer)"
        );
        Ok(())
    }

    async fn send_welcome(&self, email: &Email, user_name: &str) -> AccountsResult<()> {
        tracing::info!(
            recipient = %email,
            user_name = %user_name,
            "Welcome email queued (development mailer)"
        );
        Ok(())
    }
}
