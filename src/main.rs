mod app;
mod auth;
mod config;
mod error;
mod state;
mod users;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "usergate=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = state::AppState::init().await?;
    tracing::info!(
        app = %app_state.config.app_name,
        version = %app_state.config.app_version,
        "starting"
    );

    if let Some(seed) = app_state.config.superuser.clone() {
        users::services::ensure_superuser(app_state.store.as_ref(), &app_state.hasher, &seed)
            .await
            .map_err(|e| anyhow::anyhow!("superuser bootstrap failed: {e}"))?;
    }

    app::serve(app::build_app(app_state)).await
}
