use tracing::{info, warn};

use super::dto::{ListQuery, RegisterRequest, UserListResponse, UserUpdate};
use super::repo_types::{NewUser, User, UserChanges};
use super::store::UserStore;
use crate::auth::{password::Hasher, services::require_admin};
use crate::config::SuperuserSeed;
use crate::error::AppError;

/// Creates an account with `is_active = true` and no admin rights.
///
/// Email is checked before username; nothing is written on conflict.
pub async fn register(
    store: &dyn UserStore,
    hasher: &Hasher,
    req: RegisterRequest,
) -> Result<User, AppError> {
    if store.get_by_email(&req.email).await?.is_some() {
        warn!(email = %req.email, "email already registered");
        return Err(AppError::Conflict("Email already registered".into()));
    }
    if store.get_by_username(&req.username).await?.is_some() {
        warn!(username = %req.username, "username already taken");
        return Err(AppError::Conflict("Username already taken".into()));
    }

    let user = store
        .create(NewUser {
            email: req.email,
            username: req.username,
            full_name: req.full_name,
            hashed_password: hasher.hash(&req.password)?,
            is_active: true,
            is_superuser: false,
        })
        .await?;
    info!(user_id = user.id, username = %user.username, "user registered");
    Ok(user)
}

fn ensure_self_or_admin(actor: &User, target: &User) -> Result<(), AppError> {
    if actor.id != target.id && !actor.is_superuser {
        return Err(AppError::Forbidden("Not enough permissions"));
    }
    Ok(())
}

pub async fn get_user(store: &dyn UserStore, actor: &User, id: i64) -> Result<User, AppError> {
    let user = store.get(id).await?.ok_or(AppError::NotFound("User"))?;
    ensure_self_or_admin(actor, &user)?;
    Ok(user)
}

pub async fn list_users(
    store: &dyn UserStore,
    actor: &User,
    query: ListQuery,
) -> Result<UserListResponse, AppError> {
    require_admin(actor.clone())?;
    let items = store.list(query.offset(), query.page_size).await?;
    let total = store.count().await?;
    Ok(UserListResponse {
        total,
        items,
        page: query.page,
        page_size: query.page_size,
    })
}

/// Plain field changes first, then the password is swapped for its digest.
fn changes_for(update: UserUpdate, hasher: &Hasher) -> Result<UserChanges, AppError> {
    let mut changes = UserChanges {
        email: update.email,
        username: update.username,
        full_name: update.full_name,
        hashed_password: None,
        is_active: update.is_active,
    };
    if let Some(password) = update.password {
        changes.hashed_password = Some(hasher.hash(&password)?);
    }
    Ok(changes)
}

pub async fn update_user(
    store: &dyn UserStore,
    hasher: &Hasher,
    actor: &User,
    id: i64,
    update: UserUpdate,
) -> Result<User, AppError> {
    let user = store.get(id).await?.ok_or(AppError::NotFound("User"))?;
    ensure_self_or_admin(actor, &user)?;

    if let Some(email) = update.email.as_deref().filter(|e| *e != user.email) {
        if let Some(other) = store.get_by_email(email).await? {
            if other.id != id {
                return Err(AppError::Conflict("Email already in use".into()));
            }
        }
    }
    if let Some(username) = update.username.as_deref().filter(|u| *u != user.username) {
        if let Some(other) = store.get_by_username(username).await? {
            if other.id != id {
                return Err(AppError::Conflict("Username already in use".into()));
            }
        }
    }

    if !actor.is_superuser && update.is_active.is_some() {
        return Err(AppError::Forbidden(
            "Not enough permissions to change account status",
        ));
    }

    let changes = changes_for(update, hasher)?;
    let updated = store
        .update(id, changes)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    info!(user_id = id, actor_id = actor.id, "user updated");
    Ok(updated)
}

pub async fn delete_user(store: &dyn UserStore, actor: &User, id: i64) -> Result<(), AppError> {
    require_admin(actor.clone())?;
    let user = store.get(id).await?.ok_or(AppError::NotFound("User"))?;
    if user.id == actor.id {
        return Err(AppError::Conflict("Cannot delete your own account".into()));
    }
    if !store.delete(id).await? {
        return Err(AppError::NotFound("User"));
    }
    info!(user_id = id, actor_id = actor.id, "user deleted");
    Ok(())
}

/// Creates the configured administrator unless the username already exists.
pub async fn ensure_superuser(
    store: &dyn UserStore,
    hasher: &Hasher,
    seed: &SuperuserSeed,
) -> Result<User, AppError> {
    let seed = RegisterRequest {
        email: seed.email.clone(),
        username: seed.username.clone(),
        full_name: None,
        password: seed.password.clone(),
    }
    .validated()?;
    if let Some(existing) = store.get_by_username(&seed.username).await? {
        info!(username = %existing.username, "superuser already present");
        return Ok(existing);
    }
    let user = store
        .create(NewUser {
            hashed_password: hasher.hash(&seed.password)?,
            email: seed.email,
            username: seed.username,
            full_name: None,
            is_active: true,
            is_superuser: true,
        })
        .await?;
    info!(user_id = user.id, username = %user.username, "superuser created");
    Ok(user)
}
