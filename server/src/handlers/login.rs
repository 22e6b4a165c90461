//! Members of the login group (`F1`). Every packet of this group must arrive
//! encrypted.

use std::sync::Arc;

use async_trait::async_trait;
use protocol::packets::{PASSWORD_LONG_LEN, PASSWORD_SHORT_LEN};
use protocol::{LoginRequest, LogoutRequest};

use crate::dispatch::PacketHandler;
use crate::game::{GameAction, PlayerContext};

/// Account login. Season 6 clients widened the password field, so the two
/// dialects only differ in `password_len`.
pub struct LoginHandler {
    password_len: usize,
}

#[async_trait]
impl PacketHandler for LoginHandler {
    async fn handle(&self, ctx: &mut PlayerContext, packet: &[u8]) -> anyhow::Result<()> {
        let request = LoginRequest::parse(packet, self.password_len)?;

        if ctx.player.account.is_some() {
            log::warn!(
                "[{}] Login for {} on an already authenticated connection",
                ctx.connection_id(),
                request.username
            );
            return Ok(());
        }

        log::debug!(
            "[{}] Login attempt for {} (client {})",
            ctx.connection_id(),
            request.username,
            String::from_utf8_lossy(&request.client_version)
        );
        ctx.perform(GameAction::Login {
            username: request.username,
            password: request.password,
        })
        .await
    }
}

pub struct LogoutHandler;

#[async_trait]
impl PacketHandler for LogoutHandler {
    async fn handle(&self, ctx: &mut PlayerContext, packet: &[u8]) -> anyhow::Result<()> {
        let request = LogoutRequest::parse(packet)?;
        ctx.perform(GameAction::Logout { kind: request.kind }).await
    }
}

pub fn login_short_password() -> Arc<dyn PacketHandler> {
    Arc::new(LoginHandler {
        password_len: PASSWORD_SHORT_LEN,
    })
}

pub fn login_long_password() -> Arc<dyn PacketHandler> {
    Arc::new(LoginHandler {
        password_len: PASSWORD_LONG_LEN,
    })
}

pub fn logout() -> Arc<dyn PacketHandler> {
    Arc::new(LogoutHandler)
}
