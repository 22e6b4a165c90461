use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use protocol::FrameCodec;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::connection::{serve_connection, ConnectionServices};
use super::SessionManager;
use crate::config::ServerConfig;
use crate::dispatch::PacketDispatcher;
use crate::game::GameActions;

pub struct GatewayHandle {
    local_addr: SocketAddr,
    sessions: SessionManager,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl GatewayHandle {
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Stops accepting and asks every open connection to finish.
    pub fn close(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Closes the gateway and waits for the accept loop to end.
    pub async fn shutdown(self) {
        self.close();
        if let Err(err) = self.task.await {
            log::warn!("Gateway task ended abnormally: {}", err);
        }
    }
}

pub async fn start_gateway(
    config: &ServerConfig,
    dispatcher: PacketDispatcher,
    actions: Arc<dyn GameActions>,
) -> anyhow::Result<GatewayHandle> {
    let bind_addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind game gateway on '{}'", bind_addr))?;
    let local_addr = listener
        .local_addr()
        .context("failed to resolve gateway local address")?;

    let sessions = SessionManager::new();
    let services = ConnectionServices {
        dispatcher,
        actions,
        codec: FrameCodec::new(config.codec.limits()),
        sessions: sessions.clone(),
    };
    let (shutdown, shutdown_rx) = watch::channel(false);

    let task = tokio::spawn(accept_loop(listener, services, shutdown_rx));
    log::info!("Game gateway listening on {}", local_addr);

    Ok(GatewayHandle {
        local_addr,
        sessions,
        shutdown,
        task,
    })
}

// Pause after a failed accept (e.g. the process ran out of descriptors).
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

async fn accept_loop(
    listener: TcpListener,
    services: ConnectionServices,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let (stream, peer) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(err) => {
                    log::warn!("Failed to accept connection: {}", err);
                    tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
                    continue;
                }
            },
            _ = shutdown.changed() => break,
        };

        tokio::spawn(handle_connection(
            stream,
            peer,
            services.clone(),
            shutdown.clone(),
        ));
    }

    log::info!("Game gateway stopped accepting connections");
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    services: ConnectionServices,
    shutdown: watch::Receiver<bool>,
) {
    if let Err(err) = stream.set_nodelay(true) {
        log::debug!("Failed to set TCP_NODELAY for {}: {}", peer, err);
    }

    let sessions = services.sessions.clone();
    let connection_id = sessions.open(peer);

    if let Err(err) = serve_connection(stream, connection_id, services, shutdown).await {
        log::warn!("[{}] Connection from {} closed: {}", connection_id, peer, err);
    }

    sessions.close(connection_id);
}
