//! Account Entity
//!
//! One aggregate owns everything the credential and token lifecycle mutates:
//! the stored password, the verification/active flags, and both one-time
//! token slots. Keeping the fields on a single row lets the store consume a
//! token and apply its state transition in one atomic update.
//!
//! ## Verification state machine
//! `Unverified` → (issue verification token) → `Unverified` with live token
//! → (consume) → `Verified/Active`. The forward transition is irreversible:
//! nothing in this lifecycle deactivates an account again.

use chrono::{DateTime, Utc};

use crate::domain::value_object::{
    account_id::AccountId,
    email::Email,
    one_time_token::{OneTimeToken, TokenKind},
    password::StoredPassword,
    public_id::PublicId,
    role::AccountRole,
    user_name::UserName,
};

/// Account entity
#[derive(Debug, Clone)]
pub struct Account {
    /// Internal UUID identifier
    pub account_id: AccountId,
    /// Public-facing nanoid identifier (URL-safe)
    pub public_id: PublicId,
    /// User name (unique, for login and display)
    pub user_name: UserName,
    /// Email address (unique, lowercased)
    pub email: Email,
    /// Optional display name
    pub display_name: Option<String>,
    /// Role (Member, Admin)
    pub role: AccountRole,
    /// Encoded password credential
    pub password: StoredPassword,
    /// Whether the email address has been verified
    pub email_verified: bool,
    /// Whether the account may log in
    pub active: bool,
    /// Live email-verification token, if any
    pub verification_token: Option<OneTimeToken>,
    /// Live password-reset token, if any
    pub reset_token: Option<OneTimeToken>,
    /// Last successful login time
    pub last_login_at: Option<DateTime<Utc>>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a freshly registered account
    ///
    /// Starts unverified and inactive; only successful email verification
    /// activates it.
    pub fn register(
        user_name: UserName,
        email: Email,
        display_name: Option<String>,
        password: StoredPassword,
    ) -> Self {
        let now = Utc::now();

        Self {
            account_id: AccountId::new(),
            public_id: PublicId::new(),
            user_name,
            email,
            display_name,
            role: AccountRole::default(),
            password,
            email_verified: false,
            active: false,
            verification_token: None,
            reset_token: None,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Issue a new email-verification token
    ///
    /// Overwrites any prior unconsumed token; the old value becomes
    /// permanently invalid. Returns the token for out-of-band delivery.
    pub fn issue_verification_token(&mut self, now: DateTime<Utc>) -> OneTimeToken {
        let token = OneTimeToken::issue(TokenKind::EmailVerification, now);
        self.verification_token = Some(token.clone());
        self.updated_at = now;
        token
    }

    /// Issue a new password-reset token, superseding any prior one
    pub fn issue_reset_token(&mut self, now: DateTime<Utc>) -> OneTimeToken {
        let token = OneTimeToken::issue(TokenKind::PasswordReset, now);
        self.reset_token = Some(token.clone());
        self.updated_at = now;
        token
    }

    /// Apply the successful-verification transition
    ///
    /// Sets both flags and clears the token slot in one step; the store must
    /// persist all of it atomically with the token match.
    pub fn confirm_email(&mut self, now: DateTime<Utc>) {
        self.email_verified = true;
        self.active = true;
        self.verification_token = None;
        self.updated_at = now;
    }

    /// Clear a consumed reset token
    pub fn clear_reset_token(&mut self, now: DateTime<Utc>) {
        self.reset_token = None;
        self.updated_at = now;
    }

    /// Replace the stored password credential
    pub fn set_password(&mut self, password: StoredPassword) {
        self.password = password;
        self.updated_at = Utc::now();
    }

    /// Record successful login
    pub fn record_login(&mut self) {
        let now = Utc::now();
        self.last_login_at = Some(now);
        self.updated_at = now;
    }

    /// Update account role
    pub fn set_role(&mut self, role: AccountRole) {
        self.role = role;
        self.updated_at = Utc::now();
    }

    /// Check if the account may log in
    pub fn can_login(&self) -> bool {
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn account() -> Account {
        Account::register(
            UserName::new("alice").unwrap(),
            Email::new("alice@example.com").unwrap(),
            None,
            StoredPassword::from_db("$argon2id$v=19$m=1024,t=1,p=1$AAAA$BBBB"),
        )
    }

    #[test]
    fn test_registration_starts_inactive() {
        let account = account();
        assert!(!account.email_verified);
        assert!(!account.active);
        assert!(!account.can_login());
        assert!(account.verification_token.is_none());
        assert!(account.reset_token.is_none());
        assert_eq!(account.role, AccountRole::Member);
    }

    #[test]
    fn test_confirm_email_activates_and_clears_token() {
        let mut account = account();
        let now = Utc::now();
        account.issue_verification_token(now);

        account.confirm_email(now);

        assert!(account.email_verified);
        assert!(account.active);
        assert!(account.can_login());
        assert!(account.verification_token.is_none());
    }

    #[test]
    fn test_reissue_supersedes_previous_token() {
        let mut account = account();
        let now = Utc::now();

        let first = account.issue_verification_token(now);
        let second = account.issue_verification_token(now + Duration::minutes(5));

        let live = account.verification_token.as_ref().unwrap();
        assert!(!live.matches(first.value()));
        assert!(live.matches(second.value()));
        // Expiry moved with the re-issuance
        assert_eq!(live.expires_at(), second.expires_at());
    }

    #[test]
    fn test_reset_token_slot_is_independent() {
        let mut account = account();
        let now = Utc::now();

        account.issue_verification_token(now);
        let reset = account.issue_reset_token(now);

        assert!(account.verification_token.is_some());
        assert!(account.reset_token.as_ref().unwrap().matches(reset.value()));

        account.clear_reset_token(now);
        assert!(account.reset_token.is_none());
        assert!(account.verification_token.is_some());
    }
}
