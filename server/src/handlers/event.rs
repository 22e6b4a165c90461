//! Members of the mini-game event group (`D0`).

use std::sync::Arc;

use async_trait::async_trait;
use protocol::{EnterEventRequest, EventRemainTimeRequest};

use crate::dispatch::PacketHandler;
use crate::game::{GameAction, PlayerContext};

pub struct EnterEventHandler;

#[async_trait]
impl PacketHandler for EnterEventHandler {
    async fn handle(&self, ctx: &mut PlayerContext, packet: &[u8]) -> anyhow::Result<()> {
        let request = EnterEventRequest::parse(packet)?;
        if ctx.player.character.is_none() {
            log::warn!("[{}] Event entry without character", ctx.connection_id());
            return Ok(());
        }
        ctx.perform(GameAction::EnterEvent {
            event_kind: request.event_kind,
            level: request.level,
        })
        .await
    }
}

pub struct EventRemainTimeHandler;

#[async_trait]
impl PacketHandler for EventRemainTimeHandler {
    async fn handle(&self, ctx: &mut PlayerContext, packet: &[u8]) -> anyhow::Result<()> {
        let request = EventRemainTimeRequest::parse(packet)?;
        ctx.perform(GameAction::EventRemainTime {
            event_type: request.event_type,
            item_level: request.item_level,
        })
        .await
    }
}

pub fn enter() -> Arc<dyn PacketHandler> {
    Arc::new(EnterEventHandler)
}

pub fn remain_time() -> Arc<dyn PacketHandler> {
    Arc::new(EventRemainTimeHandler)
}
