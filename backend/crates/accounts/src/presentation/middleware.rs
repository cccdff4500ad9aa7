//! Accounts Middleware
//!
//! Middleware for requiring an administrator on the management routes.

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::str::FromStr;

use crate::application::access_token::verify_access_token;
use crate::application::mailer::AccountMailer;
use crate::domain::repository::AccountRepository;
use crate::domain::value_object::public_id::PublicId;
use crate::error::AccountsError;
use crate::presentation::handlers::AccountsAppState;

/// Authenticated account info stored in request extensions
#[derive(Debug, Clone)]
pub struct AuthenticatedAccount {
    pub public_id: String,
}

/// Middleware that requires a valid admin bearer token
///
/// The token only proves identity; the role is re-read from the store so a
/// demotion takes effect on the next request, not at token expiry.
pub async fn require_admin<R, M>(
    State(state): State<AccountsAppState<R, M>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response>
where
    R: AccountRepository + Clone + Send + Sync + 'static,
    M: AccountMailer + Clone + Send + Sync + 'static,
{
    let token = bearer_token(&req).ok_or_else(|| {
        AccountsError::AccessTokenInvalid.into_response()
    })?;

    let claims = verify_access_token(&state.config.access_token_secret, token)
        .ok_or_else(|| AccountsError::AccessTokenInvalid.into_response())?;

    let public_id = PublicId::from_str(&claims.public_id)
        .map_err(|_| AccountsError::AccessTokenInvalid.into_response())?;

    let account = match state.repo.find_by_public_id(&public_id).await {
        Ok(Some(account)) => account,
        Ok(None) => return Err(AccountsError::AccessTokenInvalid.into_response()),
        Err(e) => return Err(e.into_response()),
    };

    if !account.active || !account.role.is_admin() {
        return Err(AccountsError::AdminRequired.into_response());
    }

    req.extensions_mut().insert(AuthenticatedAccount {
        public_id: claims.public_id,
    });

    Ok(next.run(req).await)
}

/// Extract the token from an `Authorization: Bearer ...` header
fn bearer_token(req: &Request<Body>) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
