use tracing::{info, warn};

use super::{jwt::JwtKeys, password::Hasher};
use crate::error::AppError;
use crate::users::{repo_types::User, store::UserStore};

/// Emails are stored lowercased; usernames are case-sensitive.
pub(crate) fn normalize_identifier(identifier: &str) -> String {
    let trimmed = identifier.trim();
    if trimmed.contains('@') {
        trimmed.to_lowercase()
    } else {
        trimmed.to_string()
    }
}

/// Checks credentials and returns the authenticated user.
///
/// Unknown identifier and wrong password produce the same error.
pub async fn authenticate(
    store: &dyn UserStore,
    hasher: &Hasher,
    identifier: &str,
    password: &str,
) -> Result<User, AppError> {
    let identifier = normalize_identifier(identifier);
    let Some(user) = store.get_by_username_or_email(&identifier).await? else {
        warn!(%identifier, "login unknown identifier");
        return Err(AppError::AuthenticationFailed);
    };

    if !hasher.verify(password, &user.hashed_password) {
        warn!(user_id = user.id, "login invalid password");
        return Err(AppError::AuthenticationFailed);
    }
    Ok(user)
}

/// Credentials in, bearer token out.
pub async fn login(
    store: &dyn UserStore,
    hasher: &Hasher,
    keys: &JwtKeys,
    identifier: &str,
    password: &str,
) -> Result<String, AppError> {
    let user = authenticate(store, hasher, identifier, password).await?;
    let user = require_active(user)?;
    let token = keys.issue(user.id)?;
    info!(user_id = user.id, username = %user.username, "user logged in");
    Ok(token)
}

/// Maps a bearer token back to a stored user.
pub async fn resolve(store: &dyn UserStore, keys: &JwtKeys, token: &str) -> Result<User, AppError> {
    let user_id = keys.verify(token).map_err(|_| AppError::Unauthenticated)?;
    match store.get(user_id).await? {
        Some(user) => Ok(user),
        None => {
            warn!(user_id, "token subject no longer exists");
            Err(AppError::Unauthenticated)
        }
    }
}

pub fn require_active(user: User) -> Result<User, AppError> {
    if !user.is_active {
        return Err(AppError::AccountDisabled);
    }
    Ok(user)
}

pub fn require_admin(user: User) -> Result<User, AppError> {
    if !user.is_superuser {
        return Err(AppError::Forbidden("Administrator privileges required"));
    }
    Ok(user)
}
