use axum::middleware;
use dotenvy::dotenv;
use log::info;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use learnserver::api_router::configure_api_routes;
use learnserver::auth;
use learnserver::config::AppConfig;
use learnserver::llm::{LlmProvider, OpenAiClient};
use learnserver::shared::state::AppState;
use learnserver::shared::utils::create_conn;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .write_style(env_logger::WriteStyle::Always)
        .init();

    let config = AppConfig::from_env()?;

    let pool = create_conn(&config.database_url())
        .map_err(|e| anyhow::anyhow!("Failed to create database pool: {e}"))?;

    let llm_provider: Arc<dyn LlmProvider> = Arc::new(OpenAiClient::new(
        config.llm.api_key.clone(),
        Some(config.llm.base_url.clone()),
    ));

    let app_state = Arc::new(AppState {
        config: config.clone(),
        conn: pool,
        llm_provider,
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = configure_api_routes()
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            auth::authentication_middleware,
        ))
        .layer(cors)
        .with_state(app_state);

    let addr = (config.server.host.as_str(), config.server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        "HTTP server listening on {}:{}",
        config.server.host, config.server.port
    );

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    info!("Shutting down HTTP server...");
}
