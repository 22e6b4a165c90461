// Library exports for testing and reuse

pub mod config;
pub mod dispatch;
pub mod error;
pub mod game;
pub mod handlers;
pub mod session;

use std::sync::Arc;

use config::ServerConfig;
use dispatch::{PacketDispatcher, VersionGate};
use error::Result;

/// Builds the version gate over the bundled catalog for the configured
/// client version, applies the configured handler toggles and returns the
/// dispatcher routing through its registry.
pub fn build_dispatcher(config: &ServerConfig) -> Result<(Arc<VersionGate>, PacketDispatcher)> {
    let gate = Arc::new(VersionGate::new(handlers::catalog(), config.client_version));
    gate.initialize();

    for id in &config.disabled_handlers {
        gate.set_enabled(id, false)?;
    }

    let dispatcher = PacketDispatcher::new(gate.registry());
    Ok((gate, dispatcher))
}
