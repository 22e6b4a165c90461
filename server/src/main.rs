use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::time;

use server::config::ServerConfig;
use server::game::LoggingGameActions;
use server::session::start_gateway;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (for development)
    // Try loading from current directory first, then from server/ directory
    if dotenvy::dotenv().is_err() {
        dotenvy::from_filename("server/.env").ok();
    }

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    log::info!("Starting game server...");
    log::info!("Protocol version: {}", protocol::protocol_version());

    let config = ServerConfig::load_from_env().context("failed to load server configuration")?;
    log::info!(
        "Serving client {} with {} disabled handlers",
        config.client_version,
        config.disabled_handlers.len()
    );

    let (gate, dispatcher) =
        server::build_dispatcher(&config).context("failed to build packet dispatcher")?;
    log::info!(
        "{} handlers known, {} constructed",
        gate.catalog().len(),
        gate.pool().len()
    );

    // This binary serves the configured dialect only. `gate` stays alive as the
    // ClientVersionObserver a login collaborator notifies on a version change.
    let gateway = start_gateway(&config, dispatcher, Arc::new(LoggingGameActions))
        .await
        .context("failed to start game gateway")?;

    let sessions = gateway.sessions().clone();
    tokio::spawn(async move {
        let mut interval = time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            log::info!("{} connections online", sessions.len());
        }
    });

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    log::info!("Shutting down...");
    gateway.shutdown().await;
    drop(gate);

    Ok(())
}
