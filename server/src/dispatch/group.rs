//! Handlers that fan a single opcode out into sub-opcode specific handlers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use protocol::{ClientVersion, read_header, sub_opcode_at};

use super::handler::{PacketHandler, RegisteredHandler};
use super::registry::{ReconcileReport, StrategyRegistry};
use crate::game::PlayerContext;

/// Hosts the members of one packet group in a nested registry keyed by
/// sub-opcode. Only handlers tagged with this group's opcode are ever added.
pub struct GroupDispatcher {
    opcode: u8,
    registry: StrategyRegistry,
    initialized: AtomicBool,
}

impl GroupDispatcher {
    #[must_use]
    pub fn new(opcode: u8) -> Self {
        Self {
            opcode,
            registry: StrategyRegistry::new(
                format!("group {opcode:02X}"),
                ClientVersion::SEASON_6,
            ),
            initialized: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn opcode(&self) -> u8 {
        self.opcode
    }

    #[must_use]
    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Loads the members supporting `version` and opens the group for
    /// dispatch. Calling it again re-targets the group to a new version.
    pub fn initialize(
        &self,
        version: ClientVersion,
        members: Vec<Arc<RegisteredHandler>>,
    ) -> ReconcileReport {
        let (members, foreign): (Vec<_>, Vec<_>) = members
            .into_iter()
            .partition(|member| member.descriptor.belongs_to(Some(self.opcode)));
        for stranger in &foreign {
            log::warn!(
                "[group {:02X}] Ignoring {} which belongs elsewhere",
                self.opcode,
                stranger.descriptor
            );
        }

        let report = self.registry.reconcile(version, members);
        if !self.initialized.swap(true, Ordering::AcqRel) {
            log::debug!(
                "[group {:02X}] Initialized with {} members",
                self.opcode,
                self.registry.registered_ids().len()
            );
        }
        report
    }
}

#[async_trait]
impl PacketHandler for GroupDispatcher {
    async fn handle(&self, ctx: &mut PlayerContext, packet: &[u8]) -> anyhow::Result<()> {
        if !self.is_initialized() {
            log::warn!(
                "[group {:02X}] Packet received before initialization, dropped",
                self.opcode
            );
            return Ok(());
        }

        let Some(sub_opcode) = sub_opcode_at(packet) else {
            log::debug!(
                "[group {:02X}] Packet without sub-opcode from connection {}",
                self.opcode,
                ctx.connection_id()
            );
            return Ok(());
        };

        let Some(member) = self.registry.lookup(sub_opcode) else {
            log::warn!(
                "[group {:02X}] Unimplemented sub-opcode {:02X} from connection {}",
                self.opcode,
                sub_opcode,
                ctx.connection_id()
            );
            return Ok(());
        };

        let encrypted = read_header(packet).is_ok_and(|header| header.is_encrypted);
        if member.descriptor.encryption_expected && !encrypted {
            log::warn!(
                "[group {:02X}] {} expects an encrypted packet, dropped plaintext from connection {}",
                self.opcode,
                member.descriptor,
                ctx.connection_id()
            );
            return Ok(());
        }

        member.handler.handle(ctx, packet).await
    }

    fn as_group(&self) -> Option<&GroupDispatcher> {
        Some(self)
    }
}
