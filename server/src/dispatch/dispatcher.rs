//! Entry point for every inbound packet of every connection.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use protocol::read_header;

use super::registry::StrategyRegistry;
use crate::game::PlayerContext;

/// What happened to a dispatched packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    Handled,
    /// The buffer did not contain a readable header.
    Malformed,
    /// No handler is effective for the opcode.
    UnknownOpcode(u8),
    /// The handler expects an encrypted packet but got a plaintext one.
    EncryptionMismatch(u8),
    /// The handler returned an error or panicked.
    Failed(u8),
}

/// Reads the header, looks up the effective handler and runs it. Nothing a
/// single packet does can escape into the connection loop.
#[derive(Clone)]
pub struct PacketDispatcher {
    registry: Arc<StrategyRegistry>,
}

impl PacketDispatcher {
    #[must_use]
    pub fn new(registry: Arc<StrategyRegistry>) -> Self {
        Self { registry }
    }

    #[must_use]
    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    pub async fn dispatch(&self, ctx: &mut PlayerContext, packet: &[u8]) -> DispatchOutcome {
        let header = match read_header(packet) {
            Ok(header) => header,
            Err(err) => {
                log::debug!(
                    "[{}] Dropping malformed packet: {err}",
                    ctx.connection_id()
                );
                return DispatchOutcome::Malformed;
            }
        };
        let opcode = header.opcode;

        let Some(entry) = self.registry.lookup(opcode) else {
            log::trace!("[{}] No handler for opcode {opcode:02X}", ctx.connection_id());
            return DispatchOutcome::UnknownOpcode(opcode);
        };

        if entry.descriptor.encryption_expected && !header.is_encrypted {
            log::warn!(
                "[{}] {} expects an encrypted packet, dropped {:?} frame",
                ctx.connection_id(),
                entry.descriptor,
                header.kind
            );
            return DispatchOutcome::EncryptionMismatch(opcode);
        }

        let packet = &packet[..header.declared_len];
        let result = AssertUnwindSafe(entry.handler.handle(ctx, packet))
            .catch_unwind()
            .await;

        match result {
            Ok(Ok(())) => DispatchOutcome::Handled,
            Ok(Err(err)) => {
                log::error!(
                    "[{}] {} failed: {err:#}",
                    ctx.connection_id(),
                    entry.descriptor
                );
                DispatchOutcome::Failed(opcode)
            }
            Err(_) => {
                log::error!(
                    "[{}] {} panicked while handling a packet",
                    ctx.connection_id(),
                    entry.descriptor
                );
                DispatchOutcome::Failed(opcode)
            }
        }
    }
}
