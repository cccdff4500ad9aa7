//! Mailer Trait
//!
//! Boundary to the out-of-band delivery collaborator. The accounts crate
//! only decides *what* to deliver; transport (SMTP etc.) lives outside.

use crate::domain::value_object::email::Email;
use crate::error::AccountsResult;

/// Account mailer trait
#[trait_variant::make(AccountMailer: Send)]
pub trait LocalAccountMailer {
    /// Deliver an email-verification link for a fresh or re-issued token
    async fn send_verification(
        &self,
        email: &Email,
        user_name: &str,
        token: &str,
    ) -> AccountsResult<()>;

    /// Deliver a password-reset link
    async fn send_password_reset(
        &self,
        email: &Email,
        user_name: &str,
        token: &str,
    ) -> AccountsResult<()>;

    /// Deliver the post-verification welcome mail
    async fn send_welcome(&self, email: &Email, user_name: &str) -> AccountsResult<()>;
}
