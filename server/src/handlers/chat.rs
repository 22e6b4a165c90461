//! Public chat (`00`) and whispers (`02`).

use std::sync::Arc;

use async_trait::async_trait;
use protocol::{ChatRequest, WhisperRequest};

use crate::dispatch::PacketHandler;
use crate::game::{GameAction, PlayerContext};

/// Public chat. The sender name in the packet is client supplied and ignored;
/// the game logic uses the selected character instead.
pub struct ChatHandler;

#[async_trait]
impl PacketHandler for ChatHandler {
    async fn handle(&self, ctx: &mut PlayerContext, packet: &[u8]) -> anyhow::Result<()> {
        let request = ChatRequest::parse(packet)?;
        if request.message.is_empty() {
            return Ok(());
        }
        ctx.perform(GameAction::Chat {
            message: request.message,
        })
        .await
    }
}

pub struct WhisperHandler;

#[async_trait]
impl PacketHandler for WhisperHandler {
    async fn handle(&self, ctx: &mut PlayerContext, packet: &[u8]) -> anyhow::Result<()> {
        let request = WhisperRequest::parse(packet)?;
        if request.receiver.is_empty() {
            log::debug!("[{}] Whisper without receiver", ctx.connection_id());
            return Ok(());
        }
        ctx.perform(GameAction::Whisper {
            receiver: request.receiver,
            message: request.message,
        })
        .await
    }
}

pub fn chat() -> Arc<dyn PacketHandler> {
    Arc::new(ChatHandler)
}

pub fn whisper() -> Arc<dyn PacketHandler> {
    Arc::new(WhisperHandler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::tests::{RecordingActions, test_context};
    use protocol::packets::{CHAT_MESSAGE_LEN, NAME_LEN};
    use protocol::{FrameBuilder, HeaderKind};

    #[tokio::test]
    async fn chat_forwards_message_only() {
        let actions = RecordingActions::new();
        let mut ctx = test_context(&actions);
        let packet = FrameBuilder::new(HeaderKind::C1, 0x00)
            .fixed_str("Impostor", NAME_LEN)
            .fixed_str("hello", CHAT_MESSAGE_LEN)
            .build()
            .unwrap();

        ChatHandler.handle(&mut ctx, &packet).await.unwrap();
        assert_eq!(
            actions.recorded(),
            vec![GameAction::Chat {
                message: "hello".into()
            }]
        );
    }

    #[tokio::test]
    async fn empty_chat_is_ignored() {
        let actions = RecordingActions::new();
        let mut ctx = test_context(&actions);
        let packet = FrameBuilder::new(HeaderKind::C1, 0x00)
            .fixed_str("Elf", NAME_LEN)
            .build()
            .unwrap();

        ChatHandler.handle(&mut ctx, &packet).await.unwrap();
        assert!(actions.recorded().is_empty());
    }

    #[tokio::test]
    async fn whisper_names_receiver() {
        let actions = RecordingActions::new();
        let mut ctx = test_context(&actions);
        let packet = FrameBuilder::new(HeaderKind::C1, 0x02)
            .fixed_str("Friend", NAME_LEN)
            .fixed_str("psst", CHAT_MESSAGE_LEN)
            .build()
            .unwrap();

        WhisperHandler.handle(&mut ctx, &packet).await.unwrap();
        assert_eq!(
            actions.recorded(),
            vec![GameAction::Whisper {
                receiver: "Friend".into(),
                message: "psst".into()
            }]
        );
    }
}
