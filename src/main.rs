use std::time::Duration;

mod admin;
mod app;
mod auth;
mod config;
mod error;
mod pages;
mod state;
mod users;
mod views;

use crate::auth::session::Session;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "clubhouse=debug,axum=info,tower_http=info".to_string());
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

    // Expired sessions are already invisible to lookups; the sweep just
    // keeps the table from growing without bound.
    let sweep_db = app_state.db.clone();
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_secs(600));
        loop {
            tick.tick().await;
            match Session::delete_expired(&sweep_db).await {
                Ok(0) => {}
                Ok(count) => tracing::debug!(count, "expired sessions swept"),
                Err(err) => tracing::warn!(error = %err, "expired session sweep failed"),
            }
        }
    });

    let app = app::build_app(app_state);
    app::serve(app).await
}
