use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{ListQuery, UserListResponse, UserUpdate},
    repo_types::User,
    services,
};
use crate::{
    auth::extractors::{AdminUser, CurrentUser},
    error::AppError,
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

#[instrument(skip(state, admin))]
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<UserListResponse>, AppError> {
    let query = query.validated()?;
    let page = services::list_users(state.store.as_ref(), &admin, query).await?;
    Ok(Json(page))
}

#[instrument(skip(state, actor))]
pub async fn get_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<User>, AppError> {
    let user = services::get_user(state.store.as_ref(), &actor, id).await?;
    Ok(Json(user))
}

#[instrument(skip(state, actor, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<UserUpdate>,
) -> Result<Json<User>, AppError> {
    let payload = payload.validated()?;
    let user =
        services::update_user(state.store.as_ref(), &state.hasher, &actor, id, payload).await?;
    Ok(Json(user))
}

#[instrument(skip(state, admin))]
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    services::delete_user(state.store.as_ref(), &admin, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
