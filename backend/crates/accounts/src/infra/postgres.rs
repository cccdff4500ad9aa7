//! PostgreSQL Repository Implementation
//!
//! Token consumption is a single conditional UPDATE keyed on the still-valid
//! token, so at-most-once semantics hold across concurrent requests and
//! multiple process instances without any in-process locking.

use chrono::{DateTime, Utc};
use nid::Nanoid;
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::entity::account::Account;
use crate::domain::repository::AccountRepository;
use crate::domain::value_object::{
    account_id::AccountId, email::Email, one_time_token::OneTimeToken, password::StoredPassword,
    public_id::PublicId, role::AccountRole, user_name::UserName,
};
use crate::error::{AccountsError, AccountsResult};

/// All account columns, in row-struct order
const ACCOUNT_COLUMNS: &str = r#"
    account_id,
    public_id,
    user_name,
    user_name_canonical,
    email,
    display_name,
    role,
    password_credential,
    email_verified,
    active,
    verification_token,
    verification_expires_at,
    reset_token,
    reset_expires_at,
    last_login_at,
    created_at,
    updated_at
"#;

/// PostgreSQL-backed account repository
#[derive(Clone)]
pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Drop token slots whose expiry has passed
    ///
    /// Purely housekeeping: expired tokens already fail validation, this
    /// just keeps dead rows from accumulating secrets.
    pub async fn cleanup_expired_tokens(&self) -> AccountsResult<u64> {
        let now = Utc::now();

        let cleared = sqlx::query(
            r#"
            UPDATE accounts SET
                verification_token = NULL,
                verification_expires_at = NULL
            WHERE verification_expires_at IS NOT NULL AND verification_expires_at <= $1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await?
        .rows_affected();

        let cleared = cleared
            + sqlx::query(
                r#"
                UPDATE accounts SET
                    reset_token = NULL,
                    reset_expires_at = NULL
                WHERE reset_expires_at IS NOT NULL AND reset_expires_at <= $1
                "#,
            )
            .bind(now)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(slots_cleared = cleared, "Cleaned up expired tokens");

        Ok(cleared)
    }

    async fn find_where(&self, clause: &str, bind: &str) -> AccountsResult<Option<Account>> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE {clause}");

        let row = sqlx::query_as::<_, AccountRow>(&query)
            .bind(bind)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.into_account()).transpose()
    }
}

impl AccountRepository for PgAccountRepository {
    async fn create(&self, account: &Account) -> AccountsResult<()> {
        sqlx::query(
            r#"
            INSERT INTO accounts (
                account_id,
                public_id,
                user_name,
                user_name_canonical,
                email,
                display_name,
                role,
                password_credential,
                email_verified,
                active,
                verification_token,
                verification_expires_at,
                reset_token,
                reset_expires_at,
                last_login_at,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(account.account_id.as_uuid())
        .bind(account.public_id.as_str())
        .bind(account.user_name.original())
        .bind(account.user_name.canonical())
        .bind(account.email.as_str())
        .bind(&account.display_name)
        .bind(account.role.id())
        .bind(account.password.as_str())
        .bind(account.email_verified)
        .bind(account.active)
        .bind(account.verification_token.as_ref().map(|t| t.value()))
        .bind(account.verification_token.as_ref().map(|t| t.expires_at()))
        .bind(account.reset_token.as_ref().map(|t| t.value()))
        .bind(account.reset_token.as_ref().map(|t| t.expires_at()))
        .bind(account.last_login_at)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, account_id: &AccountId) -> AccountsResult<Option<Account>> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE account_id = $1");

        let row = sqlx::query_as::<_, AccountRow>(&query)
            .bind(account_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.into_account()).transpose()
    }

    async fn find_by_public_id(&self, public_id: &PublicId) -> AccountsResult<Option<Account>> {
        self.find_where("public_id = $1", public_id.as_str()).await
    }

    async fn find_by_email(&self, email: &Email) -> AccountsResult<Option<Account>> {
        self.find_where("email = $1", email.as_str()).await
    }

    async fn find_by_user_name(&self, user_name: &UserName) -> AccountsResult<Option<Account>> {
        self.find_where("user_name_canonical = $1", user_name.canonical())
            .await
    }

    async fn exists_by_email(&self, email: &Email) -> AccountsResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM accounts WHERE email = $1)",
        )
        .bind(email.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn exists_by_user_name(&self, user_name: &UserName) -> AccountsResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM accounts WHERE user_name_canonical = $1)",
        )
        .bind(user_name.canonical())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn update(&self, account: &Account) -> AccountsResult<()> {
        sqlx::query(
            r#"
            UPDATE accounts SET
                user_name = $2,
                user_name_canonical = $3,
                email = $4,
                display_name = $5,
                role = $6,
                password_credential = $7,
                email_verified = $8,
                active = $9,
                verification_token = $10,
                verification_expires_at = $11,
                reset_token = $12,
                reset_expires_at = $13,
                last_login_at = $14,
                updated_at = $15
            WHERE account_id = $1
            "#,
        )
        .bind(account.account_id.as_uuid())
        .bind(account.user_name.original())
        .bind(account.user_name.canonical())
        .bind(account.email.as_str())
        .bind(&account.display_name)
        .bind(account.role.id())
        .bind(account.password.as_str())
        .bind(account.email_verified)
        .bind(account.active)
        .bind(account.verification_token.as_ref().map(|t| t.value()))
        .bind(account.verification_token.as_ref().map(|t| t.expires_at()))
        .bind(account.reset_token.as_ref().map(|t| t.value()))
        .bind(account.reset_token.as_ref().map(|t| t.expires_at()))
        .bind(account.last_login_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn consume_verification_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> AccountsResult<Option<Account>> {
        // Match and transition in one statement: if a concurrent request
        // already consumed the token, the WHERE clause no longer matches and
        // this returns no row.
        let query = format!(
            r#"
            UPDATE accounts SET
                email_verified = TRUE,
                active = TRUE,
                verification_token = NULL,
                verification_expires_at = NULL,
                updated_at = $2
            WHERE verification_token = $1 AND verification_expires_at > $2
            RETURNING {ACCOUNT_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, AccountRow>(&query)
            .bind(token)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.into_account()).transpose()
    }

    async fn consume_reset_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> AccountsResult<Option<Account>> {
        let query = format!(
            r#"
            UPDATE accounts SET
                reset_token = NULL,
                reset_expires_at = NULL,
                updated_at = $2
            WHERE reset_token = $1 AND reset_expires_at > $2
            RETURNING {ACCOUNT_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, AccountRow>(&query)
            .bind(token)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.into_account()).transpose()
    }

    async fn count_by_role(&self, role: AccountRole) -> AccountsResult<i64> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM accounts WHERE role = $1")
                .bind(role.id())
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    async fn list_by_role(&self, role: AccountRole) -> AccountsResult<Vec<Account>> {
        let query = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE role = $1 ORDER BY created_at"
        );

        let rows = sqlx::query_as::<_, AccountRow>(&query)
            .bind(role.id())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(|r| r.into_account()).collect()
    }
}

// ============================================================================
// Row Type for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct AccountRow {
    account_id: Uuid,
    public_id: String,
    user_name: String,
    #[allow(dead_code)]
    user_name_canonical: String,
    email: String,
    display_name: Option<String>,
    role: i16,
    password_credential: String,
    email_verified: bool,
    active: bool,
    verification_token: Option<String>,
    verification_expires_at: Option<DateTime<Utc>>,
    reset_token: Option<String>,
    reset_expires_at: Option<DateTime<Utc>>,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AccountRow {
    fn into_account(self) -> AccountsResult<Account> {
        let public_id = PublicId::from_nanoid(
            Nanoid::from_str(&self.public_id)
                .map_err(|e| AccountsError::Internal(format!("Invalid public_id: {}", e)))?,
        );

        let user_name = UserName::from_db(&self.user_name)
            .map_err(|e| AccountsError::Internal(format!("Invalid user_name: {}", e)))?;

        let verification_token = token_from_columns(
            self.verification_token,
            self.verification_expires_at,
        );
        let reset_token = token_from_columns(self.reset_token, self.reset_expires_at);

        Ok(Account {
            account_id: AccountId::from_uuid(self.account_id),
            public_id,
            user_name,
            email: Email::from_db(self.email),
            display_name: self.display_name,
            role: AccountRole::from_id(self.role).unwrap_or_default(),
            password: StoredPassword::from_db(self.password_credential),
            email_verified: self.email_verified,
            active: self.active,
            verification_token,
            reset_token,
            last_login_at: self.last_login_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// A token slot is only live when both columns are present
fn token_from_columns(
    value: Option<String>,
    expires_at: Option<DateTime<Utc>>,
) -> Option<OneTimeToken> {
    match (value, expires_at) {
        (Some(value), Some(expires_at)) => Some(OneTimeToken::from_parts(value, expires_at)),
        _ => None,
    }
}
