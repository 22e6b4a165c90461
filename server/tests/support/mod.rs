#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use protocol::packets::{xor3, ACCOUNT_LEN, CLIENT_SERIAL_LEN, NAME_LEN};
use protocol::{FrameBuilder, HeaderKind};
use server::game::{GameAction, GameActions, Player, PlayerContext};

/// Game logic double that records every action.
#[derive(Clone, Default)]
pub struct Recorder {
    actions: Arc<Mutex<Vec<(u64, GameAction)>>>,
}

impl Recorder {
    pub fn context(&self, connection_id: u64) -> PlayerContext {
        PlayerContext::new(connection_id, Arc::new(self.clone()))
    }

    pub fn actions(&self) -> Vec<GameAction> {
        self.actions
            .lock()
            .unwrap()
            .iter()
            .map(|(_, action)| action.clone())
            .collect()
    }

    pub fn actions_of(&self, connection_id: u64) -> Vec<GameAction> {
        self.actions
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| *id == connection_id)
            .map(|(_, action)| action.clone())
            .collect()
    }
}

#[async_trait]
impl GameActions for Recorder {
    async fn perform(
        &self,
        connection_id: u64,
        _player: &mut Player,
        action: GameAction,
    ) -> anyhow::Result<()> {
        self.actions.lock().unwrap().push((connection_id, action));
        Ok(())
    }
}

pub fn login_packet(kind: HeaderKind, username: &str, password: &str, password_len: usize) -> Vec<u8> {
    let mut account = username.as_bytes().to_vec();
    account.resize(ACCOUNT_LEN, 0);
    let mut secret = password.as_bytes().to_vec();
    secret.resize(password_len, 0);

    FrameBuilder::new(kind, 0xF1)
        .sub_opcode(0x01)
        .bytes(&xor3(&account))
        .bytes(&xor3(&secret))
        .bytes(&0u32.to_le_bytes())
        .bytes(b"10404")
        .bytes(&[b'0'; CLIENT_SERIAL_LEN])
        .build()
        .unwrap()
}

pub fn select_packet(name: &str) -> Vec<u8> {
    FrameBuilder::new(HeaderKind::C1, 0xF3)
        .sub_opcode(0x03)
        .fixed_str(name, NAME_LEN)
        .build()
        .unwrap()
}

pub fn chat_packet(message: &str) -> Vec<u8> {
    FrameBuilder::new(HeaderKind::C1, 0x00)
        .fixed_str("Sender", NAME_LEN)
        .fixed_str(message, 60)
        .build()
        .unwrap()
}

pub fn walk_packet(opcode: u8, x: u8, y: u8, packed: &[u8], steps: u8) -> Vec<u8> {
    FrameBuilder::new(HeaderKind::C1, opcode)
        .byte(x)
        .byte(y)
        .byte(0x50 | steps)
        .bytes(packed)
        .build()
        .unwrap()
}
