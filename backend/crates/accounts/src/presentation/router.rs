//! Accounts Router

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::application::config::AccountsConfig;
use crate::application::mailer::AccountMailer;
use crate::domain::repository::AccountRepository;
use crate::infra::mailer::TracingMailer;
use crate::infra::postgres::PgAccountRepository;
use crate::presentation::handlers::{self, AccountsAppState};
use crate::presentation::middleware;

/// Create the accounts router with PostgreSQL repository
///
/// Mount under `/api`: auth flows land at `/api/auth/*`, management at
/// `/api/users/*`.
pub fn accounts_router(
    repo: PgAccountRepository,
    mailer: TracingMailer,
    config: AccountsConfig,
) -> Router {
    accounts_router_generic(repo, mailer, config)
}

/// Create a generic accounts router for any repository/mailer implementation
pub fn accounts_router_generic<R, M>(repo: R, mailer: M, config: AccountsConfig) -> Router
where
    R: AccountRepository + Clone + Send + Sync + 'static,
    M: AccountMailer + Clone + Send + Sync + 'static,
{
    let state = AccountsAppState {
        repo: Arc::new(repo),
        mailer: Arc::new(mailer),
        config: Arc::new(config),
    };

    let auth = Router::new()
        .route("/register", post(handlers::register::<R, M>))
        .route("/login", post(handlers::login::<R, M>))
        .route("/verify-email", post(handlers::verify_email::<R, M>))
        .route(
            "/resend-verification",
            post(handlers::resend_verification::<R, M>),
        )
        .route("/forgot-password", post(handlers::forgot_password::<R, M>))
        .route("/reset-password", post(handlers::reset_password::<R, M>))
        .with_state(state.clone());

    let users = Router::new()
        .route("/", get(handlers::list_accounts::<R, M>))
        .route(
            "/{public_id}/role",
            get(handlers::account_role::<R, M>).put(handlers::update_account_role::<R, M>),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_admin::<R, M>,
        ))
        .with_state(state);

    Router::new().nest("/auth", auth).nest("/users", users)
}
