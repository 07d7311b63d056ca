use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Form, Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{LoginRequest, TokenResponse},
        extractors::CurrentUser,
        services,
    },
    error::AppError,
    state::AppState,
    users::{self, dto::RegisterRequest, repo_types::User},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login_form))
        .route("/auth/login/json", post(login_json))
        .route("/auth/me", get(me))
        .route("/auth/test-token", post(me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let payload = payload.validated()?;
    let user = users::services::register(state.store.as_ref(), &state.hasher, payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn issue_token(state: &AppState, payload: LoginRequest) -> Result<Json<TokenResponse>, AppError> {
    let token = services::login(
        state.store.as_ref(),
        &state.hasher,
        &state.keys,
        &payload.username,
        &payload.password,
    )
    .await?;
    Ok(Json(TokenResponse::bearer(token)))
}

/// OAuth2 password flow (`application/x-www-form-urlencoded`).
#[instrument(skip(state, payload))]
pub async fn login_form(
    State(state): State<AppState>,
    Form(payload): Form<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    issue_token(&state, payload).await
}

#[instrument(skip(state, payload))]
pub async fn login_json(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    issue_token(&state, payload).await
}

#[instrument(skip(user))]
pub async fn me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}
