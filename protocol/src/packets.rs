//! Typed views of the client requests understood by the bundled handlers.
//!
//! Every parser takes the complete packet (header included) so it works for
//! both header shapes and for the encrypted variants. Multi-byte integers are
//! little-endian unless stated otherwise, matching the client's packed
//! structures.

use common::{Direction, Point};

use crate::header::{FrameError, read_header};
use crate::walk::{WalkPath, decode_walk_path};

pub const NAME_LEN: usize = 10;
pub const ACCOUNT_LEN: usize = 10;
pub const PASSWORD_SHORT_LEN: usize = 10;
pub const PASSWORD_LONG_LEN: usize = 20;
pub const CHAT_MESSAGE_LEN: usize = 60;
/// Longest message field any client dialect sends; extra bytes are ignored.
pub const CHAT_MESSAGE_MAX_LEN: usize = 90;
pub const SECURITY_CODE_LEN: usize = 10;
pub const CLIENT_VERSION_LEN: usize = 5;
pub const CLIENT_SERIAL_LEN: usize = 16;

/// Key of the three-byte XOR applied to login credentials.
pub const XOR3_KEY: [u8; 3] = [0xFC, 0xCF, 0xAB];

/// Errors produced while interpreting a packet body.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PacketError {
    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error("{packet} body too short: need {needed} bytes, got {actual}")]
    TooShort {
        packet: &'static str,
        needed: usize,
        actual: usize,
    },
}

/// Body of a packet: everything after the opcode.
fn body(packet: &[u8]) -> Result<&[u8], PacketError> {
    let header = read_header(packet)?;
    Ok(&packet[header.body_offset..header.declared_len])
}

/// Body of a grouped packet: everything after the sub-opcode.
fn group_body(packet: &[u8]) -> Result<&[u8], PacketError> {
    let body = body(packet)?;
    Ok(body.get(1..).unwrap_or_default())
}

fn require(packet: &'static str, body: &[u8], needed: usize) -> Result<(), PacketError> {
    if body.len() < needed {
        return Err(PacketError::TooShort {
            packet,
            needed,
            actual: body.len(),
        });
    }
    Ok(())
}

/// Reads a NUL terminated string from a fixed-width field.
fn fixed_string(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}

/// Applies the credential XOR; the operation is its own inverse.
#[must_use]
pub fn xor3(field: &[u8]) -> Vec<u8> {
    field
        .iter()
        .enumerate()
        .map(|(index, byte)| byte ^ XOR3_KEY[index % XOR3_KEY.len()])
        .collect()
}

// -----------------------------------------------------------------------------
// Movement
// -----------------------------------------------------------------------------

/// Walk request: source cell, final rotation and a packed direction list.
///
/// Layout after the opcode: `x`, `y`, `rotation << 4 | step_count`, then
/// `step_count` directions packed two per byte.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WalkRequest {
    pub source: Point,
    pub rotation: Direction,
    pub step_count: usize,
    pub path: WalkPath,
}

impl WalkRequest {
    pub const MIN_BODY_LEN: usize = 3;

    pub fn parse(packet: &[u8]) -> Result<Self, PacketError> {
        let body = body(packet)?;
        require("walk", body, Self::MIN_BODY_LEN)?;

        let source = Point::new(body[0], body[1]);
        let rotation = Direction::from_nibble(body[2] >> 4);
        let step_count = usize::from(body[2] & 0x0F);
        let path = decode_walk_path(source, &body[Self::MIN_BODY_LEN..], step_count);

        Ok(Self {
            source,
            rotation,
            step_count,
            path,
        })
    }

    /// `true` if the client only turned around without moving.
    #[must_use]
    pub fn is_rotation_only(&self) -> bool {
        self.path.is_empty()
    }
}

/// Character animation, e.g. greeting or sitting down.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnimationRequest {
    pub rotation: Direction,
    pub animation: u8,
}

impl AnimationRequest {
    pub fn parse(packet: &[u8]) -> Result<Self, PacketError> {
        let body = body(packet)?;
        require("animation", body, 2)?;
        Ok(Self {
            rotation: Direction::from_nibble(body[0]),
            animation: body[1],
        })
    }
}

/// Melee attack on another object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HitRequest {
    /// Object id of the target, big-endian on the wire.
    pub target_id: u16,
    pub attack_animation: u8,
    pub look_direction: Direction,
}

impl HitRequest {
    pub fn parse(packet: &[u8]) -> Result<Self, PacketError> {
        let body = body(packet)?;
        require("hit", body, 4)?;
        Ok(Self {
            target_id: u16::from_be_bytes([body[0], body[1]]),
            attack_animation: body[2],
            look_direction: Direction::from_nibble(body[3]),
        })
    }
}

/// Client heartbeat with the attack speeds the client believes it has.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PingRequest {
    pub tick_count: u32,
    pub attack_speed: u16,
    pub magic_speed: u16,
}

impl PingRequest {
    pub fn parse(packet: &[u8]) -> Result<Self, PacketError> {
        let body = body(packet)?;
        require("ping", body, 8)?;
        Ok(Self {
            tick_count: u32::from_le_bytes([body[0], body[1], body[2], body[3]]),
            attack_speed: u16::from_le_bytes([body[4], body[5]]),
            magic_speed: u16::from_le_bytes([body[6], body[7]]),
        })
    }
}

// -----------------------------------------------------------------------------
// Chat
// -----------------------------------------------------------------------------

/// Public chat line. The sender name is filled in by the client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatRequest {
    pub sender: String,
    pub message: String,
}

impl ChatRequest {
    pub fn parse(packet: &[u8]) -> Result<Self, PacketError> {
        let body = body(packet)?;
        require("chat", body, NAME_LEN)?;
        Ok(Self {
            sender: fixed_string(&body[..NAME_LEN]),
            message: fixed_string(message_field(body)),
        })
    }
}

fn message_field(body: &[u8]) -> &[u8] {
    &body[NAME_LEN..body.len().min(NAME_LEN + CHAT_MESSAGE_MAX_LEN)]
}

/// Private message to another character.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WhisperRequest {
    pub receiver: String,
    pub message: String,
}

impl WhisperRequest {
    pub fn parse(packet: &[u8]) -> Result<Self, PacketError> {
        let body = body(packet)?;
        require("whisper", body, NAME_LEN)?;
        Ok(Self {
            receiver: fixed_string(&body[..NAME_LEN]),
            message: fixed_string(message_field(body)),
        })
    }
}

// -----------------------------------------------------------------------------
// Login group (F1)
// -----------------------------------------------------------------------------

/// Account login. Credentials are XOR3 obfuscated on the wire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    pub tick_count: u32,
    pub client_version: [u8; CLIENT_VERSION_LEN],
    pub client_serial: [u8; CLIENT_SERIAL_LEN],
}

impl LoginRequest {
    /// Parses a login request whose password field is `password_len` wide.
    pub fn parse(packet: &[u8], password_len: usize) -> Result<Self, PacketError> {
        let body = group_body(packet)?;
        let needed = ACCOUNT_LEN + password_len + 4 + CLIENT_VERSION_LEN + CLIENT_SERIAL_LEN;
        require("login", body, needed)?;

        let (account, rest) = body.split_at(ACCOUNT_LEN);
        let (password, rest) = rest.split_at(password_len);
        let (tick, rest) = rest.split_at(4);
        let (version, rest) = rest.split_at(CLIENT_VERSION_LEN);

        let mut client_version = [0; CLIENT_VERSION_LEN];
        client_version.copy_from_slice(version);
        let mut client_serial = [0; CLIENT_SERIAL_LEN];
        client_serial.copy_from_slice(&rest[..CLIENT_SERIAL_LEN]);

        Ok(Self {
            username: fixed_string(&xor3(account)),
            password: fixed_string(&xor3(password)),
            tick_count: u32::from_le_bytes([tick[0], tick[1], tick[2], tick[3]]),
            client_version,
            client_serial,
        })
    }
}

/// Kind of logout the client asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogoutKind {
    CloseGame,
    BackToCharacterSelection,
    BackToServerSelection,
    Unknown(u8),
}

impl From<u8> for LogoutKind {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::CloseGame,
            1 => Self::BackToCharacterSelection,
            2 => Self::BackToServerSelection,
            other => Self::Unknown(other),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogoutRequest {
    pub kind: LogoutKind,
}

impl LogoutRequest {
    pub fn parse(packet: &[u8]) -> Result<Self, PacketError> {
        let body = group_body(packet)?;
        require("logout", body, 1)?;
        Ok(Self {
            kind: LogoutKind::from(body[0]),
        })
    }
}

// -----------------------------------------------------------------------------
// Character group (F3)
// -----------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CharacterCreateRequest {
    pub name: String,
    pub class: u8,
}

impl CharacterCreateRequest {
    pub fn parse(packet: &[u8]) -> Result<Self, PacketError> {
        let body = group_body(packet)?;
        require("character create", body, NAME_LEN + 1)?;
        Ok(Self {
            name: fixed_string(&body[..NAME_LEN]),
            class: body[NAME_LEN],
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CharacterDeleteRequest {
    pub name: String,
    pub security_code: String,
}

impl CharacterDeleteRequest {
    pub fn parse(packet: &[u8]) -> Result<Self, PacketError> {
        let body = group_body(packet)?;
        require("character delete", body, NAME_LEN)?;
        let code_end = body.len().min(NAME_LEN + SECURITY_CODE_LEN);
        Ok(Self {
            name: fixed_string(&body[..NAME_LEN]),
            security_code: fixed_string(&body[NAME_LEN..code_end]),
        })
    }
}

/// Select a character and enter the game with it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CharacterSelectRequest {
    pub name: String,
}

impl CharacterSelectRequest {
    pub fn parse(packet: &[u8]) -> Result<Self, PacketError> {
        let body = group_body(packet)?;
        require("character select", body, NAME_LEN)?;
        Ok(Self {
            name: fixed_string(&body[..NAME_LEN]),
        })
    }
}

// -----------------------------------------------------------------------------
// Event group (D0)
// -----------------------------------------------------------------------------

/// Request to enter a mini-game event such as Blood Castle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EnterEventRequest {
    pub event_kind: u8,
    pub level: u8,
}

impl EnterEventRequest {
    pub fn parse(packet: &[u8]) -> Result<Self, PacketError> {
        let body = group_body(packet)?;
        require("enter event", body, 2)?;
        Ok(Self {
            event_kind: body[0],
            level: body[1],
        })
    }
}

/// Query for the time left until an event opens.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventRemainTimeRequest {
    pub event_type: u8,
    pub item_level: u8,
}

impl EventRemainTimeRequest {
    pub fn parse(packet: &[u8]) -> Result<Self, PacketError> {
        let body = group_body(packet)?;
        require("event remain time", body, 2)?;
        Ok(Self {
            event_type: body[0],
            item_level: body[1],
        })
    }
}
