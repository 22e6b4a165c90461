//! Bundled packet handlers and the catalog that registers them.
//!
//! Each row of [`catalog`] ties one handler implementation to the opcode and
//! client versions it serves. Dialects of the same request share their
//! handler type and only differ in their descriptor.

pub mod actions;
pub mod character;
pub mod chat;
pub mod event;
pub mod login;

use std::sync::Arc;

use protocol::{ClientVersion, Language};

use crate::dispatch::{GroupDispatcher, HandlerDescriptor, HandlerFactory, PacketHandler};

/// Top-level opcodes of the bundled handlers.
pub mod opcode {
    pub const CHAT: u8 = 0x00;
    pub const WHISPER: u8 = 0x02;
    pub const PING: u8 = 0x0E;
    pub const WALK_075: u8 = 0x10;
    pub const HIT_075: u8 = 0x11;
    pub const ANIMATION: u8 = 0x18;
    pub const EVENT_GROUP: u8 = 0xD0;
    pub const WALK_S6_KOR: u8 = 0xD3;
    pub const WALK: u8 = 0xD4;
    pub const HIT_S6_ENG: u8 = 0xD7;
    pub const LOGIN_GROUP: u8 = 0xF1;
    pub const CHARACTER_GROUP: u8 = 0xF3;
}

/// Sub-opcodes inside the groups.
pub mod sub_opcode {
    pub const LOGIN: u8 = 0x01;
    pub const LOGOUT: u8 = 0x02;

    pub const CHARACTER_LIST: u8 = 0x00;
    pub const CHARACTER_CREATE: u8 = 0x01;
    pub const CHARACTER_DELETE: u8 = 0x02;
    pub const CHARACTER_SELECT: u8 = 0x03;

    pub const ENTER_EVENT: u8 = 0x00;
    pub const EVENT_REMAIN_TIME: u8 = 0x03;
}

pub const V075: ClientVersion = ClientVersion::new(0, 75, Language::Invariant);
pub const V097: ClientVersion = ClientVersion::new(0, 97, Language::Invariant);
pub const SEASON_6: ClientVersion = ClientVersion::SEASON_6;
pub const SEASON_6_ENGLISH: ClientVersion = ClientVersion::new(1, 4, Language::English);
pub const SEASON_6_KOREAN: ClientVersion = ClientVersion::new(1, 4, Language::Korean);

fn login_group() -> Arc<dyn PacketHandler> {
    Arc::new(GroupDispatcher::new(opcode::LOGIN_GROUP))
}

fn character_group() -> Arc<dyn PacketHandler> {
    Arc::new(GroupDispatcher::new(opcode::CHARACTER_GROUP))
}

fn event_group() -> Arc<dyn PacketHandler> {
    Arc::new(GroupDispatcher::new(opcode::EVENT_GROUP))
}

/// Every handler the server knows about, whatever the client version.
#[must_use]
pub fn catalog() -> Vec<HandlerFactory> {
    use opcode::*;
    use sub_opcode::*;

    vec![
        // Movement and combat
        HandlerFactory::new(
            HandlerDescriptor::new("walk-075", WALK_075)
                .minimum_client(V075)
                .maximum_client(V097),
            actions::walk,
        ),
        HandlerFactory::new(
            HandlerDescriptor::new("walk-097", WALK).minimum_client(V097),
            actions::walk,
        ),
        HandlerFactory::new(
            HandlerDescriptor::new("walk-s6-english", WALK).minimum_client(SEASON_6_ENGLISH),
            actions::walk,
        ),
        HandlerFactory::new(
            HandlerDescriptor::new("walk-s6-korean", WALK_S6_KOR)
                .minimum_client(SEASON_6_KOREAN)
                .maximum_client(SEASON_6_KOREAN),
            actions::walk,
        ),
        HandlerFactory::new(HandlerDescriptor::new("animation", ANIMATION), actions::animation),
        HandlerFactory::new(
            HandlerDescriptor::new("hit-075", HIT_075).minimum_client(V075),
            actions::hit,
        ),
        HandlerFactory::new(
            HandlerDescriptor::new("hit-s6-english", HIT_S6_ENG)
                .minimum_client(SEASON_6_ENGLISH)
                .maximum_client(SEASON_6_ENGLISH),
            actions::hit,
        ),
        HandlerFactory::new(HandlerDescriptor::new("ping", PING), actions::ping),
        // Chat
        HandlerFactory::new(HandlerDescriptor::new("chat", CHAT), chat::chat),
        HandlerFactory::new(HandlerDescriptor::new("whisper", WHISPER), chat::whisper),
        // Login group
        HandlerFactory::new(
            HandlerDescriptor::new("login-group", LOGIN_GROUP).encrypted(),
            login_group,
        ),
        HandlerFactory::new(
            HandlerDescriptor::in_group("login", LOGIN_GROUP, LOGIN).encrypted(),
            login::login_short_password,
        ),
        HandlerFactory::new(
            HandlerDescriptor::in_group("login-long-password", LOGIN_GROUP, LOGIN)
                .minimum_client(SEASON_6)
                .encrypted(),
            login::login_long_password,
        ),
        HandlerFactory::new(
            HandlerDescriptor::in_group("logout", LOGIN_GROUP, LOGOUT).encrypted(),
            login::logout,
        ),
        // Character group
        HandlerFactory::new(
            HandlerDescriptor::new("character-group", CHARACTER_GROUP),
            character_group,
        ),
        HandlerFactory::new(
            HandlerDescriptor::in_group("character-list", CHARACTER_GROUP, CHARACTER_LIST),
            character::list,
        ),
        HandlerFactory::new(
            HandlerDescriptor::in_group("character-create", CHARACTER_GROUP, CHARACTER_CREATE),
            character::create,
        ),
        HandlerFactory::new(
            HandlerDescriptor::in_group("character-delete", CHARACTER_GROUP, CHARACTER_DELETE),
            character::delete,
        ),
        HandlerFactory::new(
            HandlerDescriptor::in_group("character-select", CHARACTER_GROUP, CHARACTER_SELECT),
            character::select,
        ),
        // Event group
        HandlerFactory::new(HandlerDescriptor::new("event-group", EVENT_GROUP), event_group),
        HandlerFactory::new(
            HandlerDescriptor::in_group("enter-event", EVENT_GROUP, ENTER_EVENT),
            event::enter,
        ),
        HandlerFactory::new(
            HandlerDescriptor::in_group("event-remain-time", EVENT_GROUP, EVENT_REMAIN_TIME),
            event::remain_time,
        ),
    ]
}
