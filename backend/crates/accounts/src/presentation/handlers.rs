//! HTTP Handlers

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use std::sync::Arc;

use crate::application::config::AccountsConfig;
use crate::application::mailer::AccountMailer;
use crate::application::{
    ForgotPasswordUseCase, LoginInput, LoginUseCase, ManageRolesUseCase, RegisterInput,
    RegisterUseCase, ResendVerificationUseCase, ResetPasswordInput, ResetPasswordUseCase,
    VerifyEmailUseCase,
};
use crate::domain::repository::AccountRepository;
use crate::error::AccountsResult;
use crate::presentation::dto::{
    AccountSummary, ForgotPasswordRequest, LoginRequest, LoginResponse, MessageResponse,
    RegisterRequest, RegisterResponse, ResendVerificationRequest, ResetPasswordRequest,
    RoleQuery, RoleResponse, UpdateRoleRequest, VerifyEmailRequest, VerifyEmailResponse,
};

/// Shared state for account handlers
#[derive(Clone)]
pub struct AccountsAppState<R, M>
where
    R: AccountRepository + Clone + Send + Sync + 'static,
    M: AccountMailer + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub mailer: Arc<M>,
    pub config: Arc<AccountsConfig>,
}

// ============================================================================
// Register
// ============================================================================

/// POST /api/auth/register
pub async fn register<R, M>(
    State(state): State<AccountsAppState<R, M>>,
    Json(req): Json<RegisterRequest>,
) -> AccountsResult<impl IntoResponse>
where
    R: AccountRepository + Clone + Send + Sync + 'static,
    M: AccountMailer + Clone + Send + Sync + 'static,
{
    let use_case = RegisterUseCase::new(
        state.repo.clone(),
        state.mailer.clone(),
        state.config.clone(),
    );

    let input = RegisterInput {
        user_name: req.user_name,
        email: req.email,
        password: req.password,
        display_name: req.display_name,
    };

    let output = use_case.execute(input).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            public_id: output.public_id,
            email: output.email,
            email_verification_required: true,
        }),
    ))
}

// ============================================================================
// Login
// ============================================================================

/// POST /api/auth/login
pub async fn login<R, M>(
    State(state): State<AccountsAppState<R, M>>,
    Json(req): Json<LoginRequest>,
) -> AccountsResult<Json<LoginResponse>>
where
    R: AccountRepository + Clone + Send + Sync + 'static,
    M: AccountMailer + Clone + Send + Sync + 'static,
{
    let use_case = LoginUseCase::new(state.repo.clone(), state.config.clone());

    let input = LoginInput {
        identifier: req.identifier,
        password: req.password,
    };

    let output = use_case.execute(input).await?;

    Ok(Json(LoginResponse {
        access_token: output.access_token,
        expires_at_ms: output.expires_at_ms,
        account: AccountSummary::from(&output.account),
    }))
}

// ============================================================================
// Email verification
// ============================================================================

/// POST /api/auth/verify-email
pub async fn verify_email<R, M>(
    State(state): State<AccountsAppState<R, M>>,
    Json(req): Json<VerifyEmailRequest>,
) -> AccountsResult<Json<VerifyEmailResponse>>
where
    R: AccountRepository + Clone + Send + Sync + 'static,
    M: AccountMailer + Clone + Send + Sync + 'static,
{
    let use_case = VerifyEmailUseCase::new(state.repo.clone(), state.mailer.clone());

    let output = use_case.execute(&req.token).await?;

    Ok(Json(VerifyEmailResponse {
        email: output.email,
        verified: true,
    }))
}

/// POST /api/auth/resend-verification
pub async fn resend_verification<R, M>(
    State(state): State<AccountsAppState<R, M>>,
    Json(req): Json<ResendVerificationRequest>,
) -> AccountsResult<Json<MessageResponse>>
where
    R: AccountRepository + Clone + Send + Sync + 'static,
    M: AccountMailer + Clone + Send + Sync + 'static,
{
    let use_case = ResendVerificationUseCase::new(state.repo.clone(), state.mailer.clone());

    use_case.execute(&req.email).await?;

    Ok(Json(MessageResponse {
        message: "Verification email sent".to_string(),
    }))
}

// ============================================================================
// Password reset
// ============================================================================

/// POST /api/auth/forgot-password
///
/// Responds identically whether or not the email is registered.
pub async fn forgot_password<R, M>(
    State(state): State<AccountsAppState<R, M>>,
    Json(req): Json<ForgotPasswordRequest>,
) -> AccountsResult<Json<MessageResponse>>
where
    R: AccountRepository + Clone + Send + Sync + 'static,
    M: AccountMailer + Clone + Send + Sync + 'static,
{
    let use_case = ForgotPasswordUseCase::new(state.repo.clone(), state.mailer.clone());

    use_case.execute(&req.email).await?;

    Ok(Json(MessageResponse {
        message: "If the email exists, a recovery link has been sent".to_string(),
    }))
}

/// POST /api/auth/reset-password
pub async fn reset_password<R, M>(
    State(state): State<AccountsAppState<R, M>>,
    Json(req): Json<ResetPasswordRequest>,
) -> AccountsResult<Json<MessageResponse>>
where
    R: AccountRepository + Clone + Send + Sync + 'static,
    M: AccountMailer + Clone + Send + Sync + 'static,
{
    let use_case = ResetPasswordUseCase::new(state.repo.clone(), state.config.clone());

    let input = ResetPasswordInput {
        token: req.token,
        new_password: req.new_password,
    };

    use_case.execute(input).await?;

    Ok(Json(MessageResponse {
        message: "Password updated".to_string(),
    }))
}

// ============================================================================
// Role management (behind require_admin middleware)
// ============================================================================

/// GET /api/users?role=admin
pub async fn list_accounts<R, M>(
    State(state): State<AccountsAppState<R, M>>,
    Query(query): Query<RoleQuery>,
) -> AccountsResult<Json<Vec<AccountSummary>>>
where
    R: AccountRepository + Clone + Send + Sync + 'static,
    M: AccountMailer + Clone + Send + Sync + 'static,
{
    let use_case = ManageRolesUseCase::new(state.repo.clone());

    let accounts = use_case.accounts_in_role(&query.role).await?;

    Ok(Json(accounts.iter().map(AccountSummary::from).collect()))
}

/// GET /api/users/{public_id}/role
pub async fn account_role<R, M>(
    State(state): State<AccountsAppState<R, M>>,
    Path(public_id): Path<String>,
) -> AccountsResult<Json<RoleResponse>>
where
    R: AccountRepository + Clone + Send + Sync + 'static,
    M: AccountMailer + Clone + Send + Sync + 'static,
{
    let use_case = ManageRolesUseCase::new(state.repo.clone());

    let role = use_case.role_of(&public_id).await?;

    Ok(Json(RoleResponse {
        public_id,
        role: role.code().to_string(),
    }))
}

/// PUT /api/users/{public_id}/role
pub async fn update_account_role<R, M>(
    State(state): State<AccountsAppState<R, M>>,
    Path(public_id): Path<String>,
    Json(req): Json<UpdateRoleRequest>,
) -> AccountsResult<Json<AccountSummary>>
where
    R: AccountRepository + Clone + Send + Sync + 'static,
    M: AccountMailer + Clone + Send + Sync + 'static,
{
    let use_case = ManageRolesUseCase::new(state.repo.clone());

    let account = use_case.assign_role(&public_id, &req.role).await?;

    Ok(Json(AccountSummary::from(&account)))
}
