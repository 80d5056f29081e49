use anyhow::{Context, Result};
use pdfchat_api::{app, session::run_session_sweeper, AppState, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize environment variables and logging
    dotenv::dotenv().ok();
    env_logger::init();

    let config = ServerConfig::from_env()?;
    log::info!(
        "Starting PDF chat server (provider: {}, session idle timeout: {}s)",
        config.provider_base_url,
        config.session_idle_timeout.as_secs()
    );

    let state = AppState::new(config.clone());
    tokio::spawn(run_session_sweeper(
        state.sessions.clone(),
        config.session_idle_timeout,
    ));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    log::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown signal received");
}
