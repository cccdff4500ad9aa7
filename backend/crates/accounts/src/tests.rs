//! Lifecycle tests for the accounts crate
//!
//! Exercises the registration / verification / reset flows end-to-end
//! against an in-memory repository that honors the same at-most-once token
//! consumption contract as the Postgres store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::application::access_token::verify_access_token;
use crate::application::config::AccountsConfig;
use crate::application::mailer::AccountMailer;
use crate::application::{
    ForgotPasswordUseCase, LoginInput, LoginUseCase, ManageRolesUseCase, RegisterInput,
    RegisterUseCase, ResendVerificationUseCase, ResetPasswordInput, ResetPasswordUseCase,
    VerifyEmailUseCase,
};
use crate::domain::entity::account::Account;
use crate::domain::repository::AccountRepository;
use crate::domain::value_object::{
    account_id::AccountId, email::Email, one_time_token::OneTimeToken, public_id::PublicId,
    role::AccountRole, user_name::UserName,
};
use crate::error::{AccountsError, AccountsResult};

// ============================================================================
// In-memory repository
// ============================================================================

/// HashMap-backed repository; consumption happens under one lock, which is
/// the single-process equivalent of the store's conditional update.
#[derive(Clone, Default)]
struct InMemoryAccounts {
    accounts: Arc<Mutex<HashMap<Uuid, Account>>>,
}

impl InMemoryAccounts {
    fn get_by_email(&self, email: &str) -> Option<Account> {
        let map = self.accounts.lock().unwrap();
        map.values().find(|a| a.email.as_str() == email).cloned()
    }

    fn verification_token_of(&self, email: &str) -> Option<OneTimeToken> {
        self.get_by_email(email)?.verification_token
    }

    fn reset_token_of(&self, email: &str) -> Option<OneTimeToken> {
        self.get_by_email(email)?.reset_token
    }

    /// Rewrite the live verification token with a past expiry
    fn force_expire_verification(&self, email: &str) {
        let mut map = self.accounts.lock().unwrap();
        let account = map
            .values_mut()
            .find(|a| a.email.as_str() == email)
            .unwrap();
        let token = account.verification_token.clone().unwrap();
        account.verification_token = Some(OneTimeToken::from_parts(
            token.value(),
            Utc::now() - Duration::hours(1),
        ));
    }
}

impl AccountRepository for InMemoryAccounts {
    async fn create(&self, account: &Account) -> AccountsResult<()> {
        let mut map = self.accounts.lock().unwrap();
        map.insert(*account.account_id.as_uuid(), account.clone());
        Ok(())
    }

    async fn find_by_id(&self, account_id: &AccountId) -> AccountsResult<Option<Account>> {
        let map = self.accounts.lock().unwrap();
        Ok(map.get(account_id.as_uuid()).cloned())
    }

    async fn find_by_public_id(&self, public_id: &PublicId) -> AccountsResult<Option<Account>> {
        let map = self.accounts.lock().unwrap();
        Ok(map
            .values()
            .find(|a| a.public_id.as_str() == public_id.as_str())
            .cloned())
    }

    async fn find_by_email(&self, email: &Email) -> AccountsResult<Option<Account>> {
        Ok(self.get_by_email(email.as_str()))
    }

    async fn find_by_user_name(&self, user_name: &UserName) -> AccountsResult<Option<Account>> {
        let map = self.accounts.lock().unwrap();
        Ok(map
            .values()
            .find(|a| a.user_name.canonical() == user_name.canonical())
            .cloned())
    }

    async fn exists_by_email(&self, email: &Email) -> AccountsResult<bool> {
        Ok(self.get_by_email(email.as_str()).is_some())
    }

    async fn exists_by_user_name(&self, user_name: &UserName) -> AccountsResult<bool> {
        Ok(self.find_by_user_name(user_name).await?.is_some())
    }

    async fn update(&self, account: &Account) -> AccountsResult<()> {
        let mut map = self.accounts.lock().unwrap();
        map.insert(*account.account_id.as_uuid(), account.clone());
        Ok(())
    }

    async fn consume_verification_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> AccountsResult<Option<Account>> {
        let mut map = self.accounts.lock().unwrap();
        for account in map.values_mut() {
            let live = account
                .verification_token
                .as_ref()
                .is_some_and(|t| t.matches(token) && t.is_live(now));
            if live {
                account.confirm_email(now);
                return Ok(Some(account.clone()));
            }
        }
        Ok(None)
    }

    async fn consume_reset_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> AccountsResult<Option<Account>> {
        let mut map = self.accounts.lock().unwrap();
        for account in map.values_mut() {
            let live = account
                .reset_token
                .as_ref()
                .is_some_and(|t| t.matches(token) && t.is_live(now));
            if live {
                account.clear_reset_token(now);
                return Ok(Some(account.clone()));
            }
        }
        Ok(None)
    }

    async fn count_by_role(&self, role: AccountRole) -> AccountsResult<i64> {
        let map = self.accounts.lock().unwrap();
        Ok(map.values().filter(|a| a.role == role).count() as i64)
    }

    async fn list_by_role(&self, role: AccountRole) -> AccountsResult<Vec<Account>> {
        let map = self.accounts.lock().unwrap();
        Ok(map.values().filter(|a| a.role == role).cloned().collect())
    }
}

// ============================================================================
// Recording mailer
// ============================================================================

#[derive(Debug, Clone)]
struct SentMail {
    kind: &'static str,
    recipient: String,
}

#[derive(Clone, Default)]
struct RecordingMailer {
    sent: Arc<Mutex<Vec<SentMail>>>,
}

impl RecordingMailer {
    fn sent_to(&self, recipient: &str) -> Vec<&'static str> {
        let sent = self.sent.lock().unwrap();
        sent.iter()
            .filter(|m| m.recipient == recipient)
            .map(|m| m.kind)
            .collect()
    }
}

impl AccountMailer for RecordingMailer {
    async fn send_verification(
        &self,
        email: &Email,
        _user_name: &str,
        _token: &str,
    ) -> AccountsResult<()> {
        self.sent.lock().unwrap().push(SentMail {
            kind: "verification",
            recipient: email.as_str().to_string(),
        });
        Ok(())
    }

    async fn send_password_reset(
        &self,
        email: &Email,
        _user_name: &str,
        _token: &str,
    ) -> AccountsResult<()> {
        self.sent.lock().unwrap().push(SentMail {
            kind: "password_reset",
            recipient: email.as_str().to_string(),
        });
        Ok(())
    }

    async fn send_welcome(&self, email: &Email, _user_name: &str) -> AccountsResult<()> {
        self.sent.lock().unwrap().push(SentMail {
            kind: "welcome",
            recipient: email.as_str().to_string(),
        });
        Ok(())
    }
}

// ============================================================================
// Test fixture
// ============================================================================

struct Fixture {
    repo: InMemoryAccounts,
    mailer: RecordingMailer,
    config: Arc<AccountsConfig>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            repo: InMemoryAccounts::default(),
            mailer: RecordingMailer::default(),
            config: Arc::new(AccountsConfig::development()),
        }
    }

    async fn register(&self, user_name: &str, email: &str) -> String {
        let use_case = RegisterUseCase::new(
            Arc::new(self.repo.clone()),
            Arc::new(self.mailer.clone()),
            self.config.clone(),
        );
        let output = use_case
            .execute(RegisterInput {
                user_name: user_name.to_string(),
                email: email.to_string(),
                password: "CorrectHorse9!".to_string(),
                display_name: None,
            })
            .await
            .unwrap();
        output.public_id
    }

    async fn verify(&self, token: &str) -> AccountsResult<crate::application::VerifyEmailOutput> {
        VerifyEmailUseCase::new(Arc::new(self.repo.clone()), Arc::new(self.mailer.clone()))
            .execute(token)
            .await
    }

    async fn register_verified(&self, user_name: &str, email: &str) -> String {
        let public_id = self.register(user_name, email).await;
        let token = self.repo.verification_token_of(email).unwrap();
        self.verify(token.value()).await.unwrap();
        public_id
    }

    async fn login(&self, identifier: &str, password: &str) -> AccountsResult<crate::application::LoginOutput> {
        LoginUseCase::new(Arc::new(self.repo.clone()), self.config.clone())
            .execute(LoginInput {
                identifier: identifier.to_string(),
                password: password.to_string(),
            })
            .await
    }
}

// ============================================================================
// Registration and verification
// ============================================================================

#[tokio::test]
async fn test_register_leaves_account_inactive_with_live_token() {
    let fx = Fixture::new();
    fx.register("alice", "alice@example.com").await;

    let account = fx.repo.get_by_email("alice@example.com").unwrap();
    assert!(!account.email_verified);
    assert!(!account.active);

    let token = account.verification_token.unwrap();
    assert!(token.is_live(Utc::now()));
    // 24 hour window
    assert!(token.expires_at() > Utc::now() + Duration::hours(23));
    assert!(token.expires_at() <= Utc::now() + Duration::hours(24));
}

#[tokio::test]
async fn test_register_rejects_duplicates() {
    let fx = Fixture::new();
    fx.register("alice", "alice@example.com").await;

    let use_case = RegisterUseCase::new(
        Arc::new(fx.repo.clone()),
        Arc::new(fx.mailer.clone()),
        fx.config.clone(),
    );

    let same_email = use_case
        .execute(RegisterInput {
            user_name: "other".to_string(),
            email: "alice@example.com".to_string(),
            password: "CorrectHorse9!".to_string(),
            display_name: None,
        })
        .await;
    assert!(matches!(same_email, Err(AccountsError::EmailTaken)));

    let same_name = use_case
        .execute(RegisterInput {
            user_name: "alice".to_string(),
            email: "alice2@example.com".to_string(),
            password: "CorrectHorse9!".to_string(),
            display_name: None,
        })
        .await;
    assert!(matches!(same_name, Err(AccountsError::UserNameTaken)));
}

#[tokio::test]
async fn test_verification_activates_account() {
    let fx = Fixture::new();
    fx.register("alice", "alice@example.com").await;

    let token = fx.repo.verification_token_of("alice@example.com").unwrap();
    let output = fx.verify(token.value()).await.unwrap();
    assert_eq!(output.email, "alice@example.com");

    let account = fx.repo.get_by_email("alice@example.com").unwrap();
    assert!(account.email_verified);
    assert!(account.active);
    assert!(account.verification_token.is_none());
}

#[tokio::test]
async fn test_verification_token_consumed_exactly_once() {
    let fx = Fixture::new();
    fx.register("alice", "alice@example.com").await;

    let token = fx.repo.verification_token_of("alice@example.com").unwrap();
    assert!(fx.verify(token.value()).await.is_ok());

    // Replay with the exact same string fails
    let replay = fx.verify(token.value()).await;
    assert!(matches!(replay, Err(AccountsError::TokenNotFoundOrExpired)));
}

#[tokio::test]
async fn test_expired_verification_token_is_rejected() {
    let fx = Fixture::new();
    fx.register("alice", "alice@example.com").await;
    fx.repo.force_expire_verification("alice@example.com");

    let token = fx.repo.verification_token_of("alice@example.com").unwrap();
    let result = fx.verify(token.value()).await;
    assert!(matches!(result, Err(AccountsError::TokenNotFoundOrExpired)));

    // And the account stayed inactive
    let account = fx.repo.get_by_email("alice@example.com").unwrap();
    assert!(!account.active);
}

#[tokio::test]
async fn test_reissue_invalidates_previous_verification_token() {
    let fx = Fixture::new();
    fx.register("alice", "alice@example.com").await;
    let first = fx.repo.verification_token_of("alice@example.com").unwrap();

    ResendVerificationUseCase::new(Arc::new(fx.repo.clone()), Arc::new(fx.mailer.clone()))
        .execute("alice@example.com")
        .await
        .unwrap();

    let second = fx.repo.verification_token_of("alice@example.com").unwrap();
    assert_ne!(first.value(), second.value());

    // The superseded token no longer validates, the new one does
    let old = fx.verify(first.value()).await;
    assert!(matches!(old, Err(AccountsError::TokenNotFoundOrExpired)));
    assert!(fx.verify(second.value()).await.is_ok());
}

#[tokio::test]
async fn test_resend_for_verified_account_conflicts() {
    let fx = Fixture::new();
    fx.register_verified("alice", "alice@example.com").await;

    let result =
        ResendVerificationUseCase::new(Arc::new(fx.repo.clone()), Arc::new(fx.mailer.clone()))
            .execute("alice@example.com")
            .await;
    assert!(matches!(result, Err(AccountsError::AlreadyVerified)));
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_rejected_before_verification() {
    let fx = Fixture::new();
    fx.register("alice", "alice@example.com").await;

    let result = fx.login("alice@example.com", "CorrectHorse9!").await;
    assert!(matches!(result, Err(AccountsError::AccountInactive)));
}

#[tokio::test]
async fn test_login_after_verification() {
    let fx = Fixture::new();
    let public_id = fx.register_verified("alice", "alice@example.com").await;

    // By email
    let output = fx.login("alice@example.com", "CorrectHorse9!").await.unwrap();
    assert_eq!(output.account.public_id.to_string(), public_id);

    // The issued token verifies against the configured secret
    let claims =
        verify_access_token(&fx.config.access_token_secret, &output.access_token).unwrap();
    assert_eq!(claims.public_id, public_id);
    assert_eq!(claims.expires_at_ms, output.expires_at_ms);

    // By user name too
    assert!(fx.login("alice", "CorrectHorse9!").await.is_ok());
}

#[tokio::test]
async fn test_login_uniform_failure_for_bad_credentials() {
    let fx = Fixture::new();
    fx.register_verified("alice", "alice@example.com").await;

    let wrong_password = fx.login("alice@example.com", "NotThePassword1!").await;
    assert!(matches!(
        wrong_password,
        Err(AccountsError::InvalidCredentials)
    ));

    let unknown_account = fx.login("nobody@example.com", "CorrectHorse9!").await;
    assert!(matches!(
        unknown_account,
        Err(AccountsError::InvalidCredentials)
    ));
}

// ============================================================================
// Password reset
// ============================================================================

#[tokio::test]
async fn test_forgot_password_is_uniform_for_unknown_email() {
    let fx = Fixture::new();

    let use_case =
        ForgotPasswordUseCase::new(Arc::new(fx.repo.clone()), Arc::new(fx.mailer.clone()));

    // Unknown email: success, nothing sent
    assert!(use_case.execute("ghost@example.com").await.is_ok());
    assert!(fx.mailer.sent_to("ghost@example.com").is_empty());

    // Malformed email: still success
    assert!(use_case.execute("not-an-email").await.is_ok());
}

#[tokio::test]
async fn test_forgot_password_issues_short_lived_token() {
    let fx = Fixture::new();
    fx.register_verified("alice", "alice@example.com").await;

    ForgotPasswordUseCase::new(Arc::new(fx.repo.clone()), Arc::new(fx.mailer.clone()))
        .execute("alice@example.com")
        .await
        .unwrap();

    let token = fx.repo.reset_token_of("alice@example.com").unwrap();
    // 1 hour window
    assert!(token.expires_at() > Utc::now() + Duration::minutes(59));
    assert!(token.expires_at() <= Utc::now() + Duration::hours(1));

    // Welcome mail from verification is dispatched in the background, so
    // only check that the reset mail went out
    assert!(
        fx.mailer
            .sent_to("alice@example.com")
            .contains(&"password_reset")
    );
}

#[tokio::test]
async fn test_reset_password_end_to_end() {
    let fx = Fixture::new();
    fx.register_verified("alice", "alice@example.com").await;

    ForgotPasswordUseCase::new(Arc::new(fx.repo.clone()), Arc::new(fx.mailer.clone()))
        .execute("alice@example.com")
        .await
        .unwrap();
    let token = fx.repo.reset_token_of("alice@example.com").unwrap();

    ResetPasswordUseCase::new(Arc::new(fx.repo.clone()), fx.config.clone())
        .execute(ResetPasswordInput {
            token: token.value().to_string(),
            new_password: "BrandNewSecret7!".to_string(),
        })
        .await
        .unwrap();

    // Old password dead, new password works, token slot cleared
    let old = fx.login("alice@example.com", "CorrectHorse9!").await;
    assert!(matches!(old, Err(AccountsError::InvalidCredentials)));
    assert!(fx.login("alice@example.com", "BrandNewSecret7!").await.is_ok());
    assert!(fx.repo.reset_token_of("alice@example.com").is_none());

    // The consumed token cannot authorize a second reset
    let replay = ResetPasswordUseCase::new(Arc::new(fx.repo.clone()), fx.config.clone())
        .execute(ResetPasswordInput {
            token: token.value().to_string(),
            new_password: "AnotherSecret8!".to_string(),
        })
        .await;
    assert!(matches!(replay, Err(AccountsError::TokenNotFoundOrExpired)));
}

#[tokio::test]
async fn test_reset_token_superseded_by_reissue() {
    let fx = Fixture::new();
    fx.register_verified("alice", "alice@example.com").await;

    let use_case =
        ForgotPasswordUseCase::new(Arc::new(fx.repo.clone()), Arc::new(fx.mailer.clone()));
    use_case.execute("alice@example.com").await.unwrap();
    let first = fx.repo.reset_token_of("alice@example.com").unwrap();

    use_case.execute("alice@example.com").await.unwrap();
    let second = fx.repo.reset_token_of("alice@example.com").unwrap();
    assert_ne!(first.value(), second.value());

    let stale = ResetPasswordUseCase::new(Arc::new(fx.repo.clone()), fx.config.clone())
        .execute(ResetPasswordInput {
            token: first.value().to_string(),
            new_password: "BrandNewSecret7!".to_string(),
        })
        .await;
    assert!(matches!(stale, Err(AccountsError::TokenNotFoundOrExpired)));
}

#[tokio::test]
async fn test_reset_rejects_weak_replacement_before_spending_token() {
    let fx = Fixture::new();
    fx.register_verified("alice", "alice@example.com").await;

    ForgotPasswordUseCase::new(Arc::new(fx.repo.clone()), Arc::new(fx.mailer.clone()))
        .execute("alice@example.com")
        .await
        .unwrap();
    let token = fx.repo.reset_token_of("alice@example.com").unwrap();

    let use_case = ResetPasswordUseCase::new(Arc::new(fx.repo.clone()), fx.config.clone());
    let weak = use_case
        .execute(ResetPasswordInput {
            token: token.value().to_string(),
            new_password: "short".to_string(),
        })
        .await;
    assert!(matches!(weak, Err(AccountsError::PasswordValidation(_))));

    // The token survived the rejected attempt
    assert!(
        use_case
            .execute(ResetPasswordInput {
                token: token.value().to_string(),
                new_password: "BrandNewSecret7!".to_string(),
            })
            .await
            .is_ok()
    );
}

// ============================================================================
// Role management
// ============================================================================

#[tokio::test]
async fn test_last_admin_cannot_be_demoted() {
    let fx = Fixture::new();
    let alice = fx.register_verified("alice", "alice@example.com").await;
    let bob = fx.register_verified("bob", "bob@example.com").await;

    let use_case = ManageRolesUseCase::new(Arc::new(fx.repo.clone()));

    use_case.assign_role(&alice, "admin").await.unwrap();
    assert_eq!(use_case.role_of(&alice).await.unwrap(), AccountRole::Admin);

    // Alice is the only admin
    let demote = use_case.assign_role(&alice, "member").await;
    assert!(matches!(demote, Err(AccountsError::LastAdministrator)));

    // With a second admin the demotion goes through
    use_case.assign_role(&bob, "admin").await.unwrap();
    assert!(use_case.assign_role(&alice, "member").await.is_ok());
    assert_eq!(use_case.role_of(&alice).await.unwrap(), AccountRole::Member);
}

#[tokio::test]
async fn test_unknown_role_is_rejected() {
    let fx = Fixture::new();
    let alice = fx.register_verified("alice", "alice@example.com").await;

    let use_case = ManageRolesUseCase::new(Arc::new(fx.repo.clone()));
    let result = use_case.assign_role(&alice, "superuser").await;
    assert!(matches!(result, Err(AccountsError::UnknownRole(_))));
}

#[tokio::test]
async fn test_accounts_in_role_lists_members() {
    let fx = Fixture::new();
    fx.register_verified("alice", "alice@example.com").await;
    fx.register_verified("bob", "bob@example.com").await;

    let use_case = ManageRolesUseCase::new(Arc::new(fx.repo.clone()));
    let members = use_case.accounts_in_role("member").await.unwrap();
    assert_eq!(members.len(), 2);
    assert!(use_case.accounts_in_role("admin").await.unwrap().is_empty());
}
