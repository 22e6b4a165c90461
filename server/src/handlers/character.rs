//! Members of the character group (`F3`).

use std::sync::Arc;

use async_trait::async_trait;
use protocol::{CharacterCreateRequest, CharacterDeleteRequest, CharacterSelectRequest};

use crate::dispatch::PacketHandler;
use crate::game::{GameAction, PlayerContext};

fn require_account(ctx: &PlayerContext, request: &str) -> bool {
    if ctx.player.account.is_none() {
        log::warn!(
            "[{}] {request} before login, ignored",
            ctx.connection_id()
        );
        return false;
    }
    true
}

pub struct CharacterListHandler;

#[async_trait]
impl PacketHandler for CharacterListHandler {
    async fn handle(&self, ctx: &mut PlayerContext, _packet: &[u8]) -> anyhow::Result<()> {
        if !require_account(ctx, "Character list") {
            return Ok(());
        }
        ctx.perform(GameAction::RequestCharacterList).await
    }
}

pub struct CharacterCreateHandler;

#[async_trait]
impl PacketHandler for CharacterCreateHandler {
    async fn handle(&self, ctx: &mut PlayerContext, packet: &[u8]) -> anyhow::Result<()> {
        let request = CharacterCreateRequest::parse(packet)?;
        if !require_account(ctx, "Character creation") {
            return Ok(());
        }
        ctx.perform(GameAction::CreateCharacter {
            name: request.name,
            class: request.class,
        })
        .await
    }
}

pub struct CharacterDeleteHandler;

#[async_trait]
impl PacketHandler for CharacterDeleteHandler {
    async fn handle(&self, ctx: &mut PlayerContext, packet: &[u8]) -> anyhow::Result<()> {
        let request = CharacterDeleteRequest::parse(packet)?;
        if !require_account(ctx, "Character deletion") {
            return Ok(());
        }
        ctx.perform(GameAction::DeleteCharacter {
            name: request.name,
            security_code: request.security_code,
        })
        .await
    }
}

pub struct CharacterSelectHandler;

#[async_trait]
impl PacketHandler for CharacterSelectHandler {
    async fn handle(&self, ctx: &mut PlayerContext, packet: &[u8]) -> anyhow::Result<()> {
        let request = CharacterSelectRequest::parse(packet)?;
        if !require_account(ctx, "Character selection") {
            return Ok(());
        }
        ctx.perform(GameAction::SelectCharacter { name: request.name })
            .await
    }
}

pub fn list() -> Arc<dyn PacketHandler> {
    Arc::new(CharacterListHandler)
}

pub fn create() -> Arc<dyn PacketHandler> {
    Arc::new(CharacterCreateHandler)
}

pub fn delete() -> Arc<dyn PacketHandler> {
    Arc::new(CharacterDeleteHandler)
}

pub fn select() -> Arc<dyn PacketHandler> {
    Arc::new(CharacterSelectHandler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::tests::{RecordingActions, test_context};
    use protocol::packets::NAME_LEN;
    use protocol::{FrameBuilder, HeaderKind};

    fn select_packet(name: &str) -> Vec<u8> {
        FrameBuilder::new(HeaderKind::C1, 0xF3)
            .sub_opcode(0x03)
            .fixed_str(name, NAME_LEN)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn requests_before_login_are_ignored() {
        let actions = RecordingActions::new();
        let mut ctx = test_context(&actions);

        CharacterSelectHandler
            .handle(&mut ctx, &select_packet("Hero"))
            .await
            .unwrap();
        CharacterListHandler
            .handle(&mut ctx, &[0xC1, 4, 0xF3, 0x00])
            .await
            .unwrap();
        assert!(actions.recorded().is_empty());
    }

    #[tokio::test]
    async fn select_and_create_after_login() {
        let actions = RecordingActions::new();
        let mut ctx = test_context(&actions);
        ctx.player.account = Some("admin".into());

        CharacterSelectHandler
            .handle(&mut ctx, &select_packet("Hero"))
            .await
            .unwrap();
        let create = FrameBuilder::new(HeaderKind::C1, 0xF3)
            .sub_opcode(0x01)
            .fixed_str("Wizard", NAME_LEN)
            .byte(0x00)
            .build()
            .unwrap();
        CharacterCreateHandler.handle(&mut ctx, &create).await.unwrap();

        assert_eq!(
            actions.recorded(),
            vec![
                GameAction::SelectCharacter {
                    name: "Hero".into()
                },
                GameAction::CreateCharacter {
                    name: "Wizard".into(),
                    class: 0
                },
            ]
        );
    }

    #[tokio::test]
    async fn delete_carries_security_code() {
        let actions = RecordingActions::new();
        let mut ctx = test_context(&actions);
        ctx.player.account = Some("admin".into());
        let packet = FrameBuilder::new(HeaderKind::C1, 0xF3)
            .sub_opcode(0x02)
            .fixed_str("Old", NAME_LEN)
            .fixed_str("1234567", 10)
            .build()
            .unwrap();

        CharacterDeleteHandler.handle(&mut ctx, &packet).await.unwrap();
        assert_eq!(
            actions.recorded(),
            vec![GameAction::DeleteCharacter {
                name: "Old".into(),
                security_code: "1234567".into()
            }]
        );
    }
}
