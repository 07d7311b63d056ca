use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use super::services::{require_active, require_admin, resolve};
use crate::{error::AppError, state::AppState, users::repo_types::User};

/// Reads `Authorization: Bearer <token>`; the scheme is case-insensitive.
fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Unauthenticated)?;

    let (scheme, token) = header.split_once(' ').ok_or(AppError::Unauthenticated)?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return Err(AppError::Unauthenticated);
    }
    Ok(token.trim())
}

/// Authenticated, active user.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let user = resolve(state.store.as_ref(), &state.keys, token).await?;
        Ok(CurrentUser(require_active(user)?))
    }
}

/// Authenticated, active administrator.
pub struct AdminUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        Ok(AdminUser(require_admin(user)?))
    }
}
