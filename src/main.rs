mod admin;
mod app;
mod auth;
mod config;
mod error;
mod notify;
mod oauth;
mod state;

use crate::admin::repo::Admin;
use crate::auth::password::hash_password;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "capela=debug,axum=info,tower_http=info".to_string());
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

    let app_state = AppState::init().await?;

    sqlx::migrate!("./migrations").run(&app_state.db).await?;

    // One bootstrap admin, only while the table is empty.
    if let Some(password) = &app_state.config.admin_password {
        let hash = hash_password(password)?;
        if Admin::seed_if_empty(&app_state.db, &app_state.config.admin_username, &hash).await? {
            tracing::info!(
                username = %app_state.config.admin_username,
                "bootstrap admin seeded"
            );
        }
    }

    let app = app::build_app(app_state);
    app::serve(app).await
}
