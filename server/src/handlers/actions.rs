//! Movement, animation, melee hits and the client heartbeat.

use std::sync::Arc;

use async_trait::async_trait;
use protocol::{AnimationRequest, HitRequest, PingRequest, WalkRequest};

use crate::dispatch::PacketHandler;
use crate::game::{GameAction, PlayerContext};

/// Walk request in any of its dialects; they only differ by opcode.
pub struct WalkHandler;

#[async_trait]
impl PacketHandler for WalkHandler {
    async fn handle(&self, ctx: &mut PlayerContext, packet: &[u8]) -> anyhow::Result<()> {
        let request = WalkRequest::parse(packet)?;

        if request.is_rotation_only() {
            return ctx
                .perform(GameAction::Rotate {
                    rotation: request.rotation,
                })
                .await;
        }

        if request.path.len() < request.step_count {
            log::debug!(
                "[{}] Walk path truncated to {} of {} steps",
                ctx.connection_id(),
                request.path.len(),
                request.step_count
            );
        }

        let target = request.path.target();
        ctx.perform(GameAction::Walk {
            target,
            rotation: request.rotation,
            steps: request.path.into_replay_stack(),
        })
        .await
    }
}

pub struct AnimationHandler;

#[async_trait]
impl PacketHandler for AnimationHandler {
    async fn handle(&self, ctx: &mut PlayerContext, packet: &[u8]) -> anyhow::Result<()> {
        let request = AnimationRequest::parse(packet)?;
        ctx.perform(GameAction::Animate {
            rotation: request.rotation,
            animation: request.animation,
        })
        .await
    }
}

pub struct HitHandler;

#[async_trait]
impl PacketHandler for HitHandler {
    async fn handle(&self, ctx: &mut PlayerContext, packet: &[u8]) -> anyhow::Result<()> {
        let request = HitRequest::parse(packet)?;
        ctx.perform(GameAction::Hit {
            target_id: request.target_id,
            animation: request.attack_animation,
            look: request.look_direction,
        })
        .await
    }
}

pub struct PingHandler;

#[async_trait]
impl PacketHandler for PingHandler {
    async fn handle(&self, ctx: &mut PlayerContext, packet: &[u8]) -> anyhow::Result<()> {
        let request = PingRequest::parse(packet)?;
        ctx.perform(GameAction::Ping {
            tick_count: request.tick_count,
        })
        .await
    }
}

pub fn walk() -> Arc<dyn PacketHandler> {
    Arc::new(WalkHandler)
}

pub fn animation() -> Arc<dyn PacketHandler> {
    Arc::new(AnimationHandler)
}

pub fn hit() -> Arc<dyn PacketHandler> {
    Arc::new(HitHandler)
}

pub fn ping() -> Arc<dyn PacketHandler> {
    Arc::new(PingHandler)
}
