//! Boundary between packet handlers and the game logic.
//!
//! Handlers decode a request into a [`GameAction`] and hand it to the
//! [`GameActions`] implementation of the running server. The logic behind it
//! (combat, persistence, chat fan-out) is not part of this crate; the bundled
//! [`LoggingGameActions`] only keeps the per-connection [`Player`] state up to
//! date and logs what happened.

use std::sync::Arc;

use async_trait::async_trait;
use common::{Direction, Point};
use protocol::{LogoutKind, WalkStep};

/// Per-connection player state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Player {
    pub account: Option<String>,
    pub character: Option<String>,
    pub position: Point,
    pub rotation: Direction,
    pub last_ping_tick: Option<u32>,
}

/// A decoded client request, independent of the wire dialect it came in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameAction {
    /// Steps are stored as a replay stack: popping yields walking order.
    Walk {
        target: Point,
        rotation: Direction,
        steps: Vec<WalkStep>,
    },
    Rotate {
        rotation: Direction,
    },
    Animate {
        rotation: Direction,
        animation: u8,
    },
    Hit {
        target_id: u16,
        animation: u8,
        look: Direction,
    },
    Ping {
        tick_count: u32,
    },
    Chat {
        message: String,
    },
    Whisper {
        receiver: String,
        message: String,
    },
    Login {
        username: String,
        password: String,
    },
    Logout {
        kind: LogoutKind,
    },
    RequestCharacterList,
    CreateCharacter {
        name: String,
        class: u8,
    },
    DeleteCharacter {
        name: String,
        security_code: String,
    },
    SelectCharacter {
        name: String,
    },
    EnterEvent {
        event_kind: u8,
        level: u8,
    },
    EventRemainTime {
        event_type: u8,
        item_level: u8,
    },
}

impl GameAction {
    /// Short name used in log lines.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Walk { .. } => "walk",
            Self::Rotate { .. } => "rotate",
            Self::Animate { .. } => "animate",
            Self::Hit { .. } => "hit",
            Self::Ping { .. } => "ping",
            Self::Chat { .. } => "chat",
            Self::Whisper { .. } => "whisper",
            Self::Login { .. } => "login",
            Self::Logout { .. } => "logout",
            Self::RequestCharacterList => "character-list",
            Self::CreateCharacter { .. } => "create-character",
            Self::DeleteCharacter { .. } => "delete-character",
            Self::SelectCharacter { .. } => "select-character",
            Self::EnterEvent { .. } => "enter-event",
            Self::EventRemainTime { .. } => "event-remain-time",
        }
    }
}

/// Game logic invoked by the handlers. Implementations may suspend; the
/// connection waits for them before reading its next packet.
#[async_trait]
pub trait GameActions: Send + Sync {
    async fn perform(
        &self,
        connection_id: u64,
        player: &mut Player,
        action: GameAction,
    ) -> anyhow::Result<()>;
}

/// Everything a handler needs to act on behalf of one connection.
pub struct PlayerContext {
    connection_id: u64,
    pub player: Player,
    actions: Arc<dyn GameActions>,
}

impl PlayerContext {
    #[must_use]
    pub fn new(connection_id: u64, actions: Arc<dyn GameActions>) -> Self {
        Self {
            connection_id,
            player: Player::default(),
            actions,
        }
    }

    #[must_use]
    pub fn connection_id(&self) -> u64 {
        self.connection_id
    }

    pub async fn perform(&mut self, action: GameAction) -> anyhow::Result<()> {
        self.actions
            .perform(self.connection_id, &mut self.player, action)
            .await
    }
}

/// Game logic stand-in that applies state changes to the [`Player`] and logs.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingGameActions;

#[async_trait]
impl GameActions for LoggingGameActions {
    async fn perform(
        &self,
        connection_id: u64,
        player: &mut Player,
        action: GameAction,
    ) -> anyhow::Result<()> {
        log::trace!("[{connection_id}] Performing {}", action.name());
        match action {
            GameAction::Walk {
                target,
                rotation,
                mut steps,
            } => {
                while let Some(step) = steps.pop() {
                    log::trace!(
                        "[{connection_id}] Step {:?} {} -> {}",
                        step.direction,
                        step.from,
                        step.to
                    );
                    player.position = step.to;
                }
                player.rotation = rotation;
                log::debug!("[{connection_id}] Walked to {target}");
            }
            GameAction::Rotate { rotation } => player.rotation = rotation,
            GameAction::Animate {
                rotation,
                animation,
            } => {
                player.rotation = rotation;
                log::debug!("[{connection_id}] Animation {animation}");
            }
            GameAction::Hit {
                target_id,
                animation,
                look,
            } => {
                player.rotation = look;
                log::debug!("[{connection_id}] Hit target {target_id} with animation {animation}");
            }
            GameAction::Ping { tick_count } => player.last_ping_tick = Some(tick_count),
            GameAction::Chat { message } => {
                let sender = player.character.as_deref().unwrap_or("?");
                log::info!("[{connection_id}] {sender}: {message}");
            }
            GameAction::Whisper { receiver, message } => {
                let sender = player.character.as_deref().unwrap_or("?");
                log::info!("[{connection_id}] {sender} -> {receiver}: {message}");
            }
            GameAction::Login { username, .. } => {
                log::info!("[{connection_id}] Account {username} logged in");
                player.account = Some(username);
            }
            GameAction::Logout { kind } => {
                log::info!("[{connection_id}] Logout requested: {kind:?}");
                player.character = None;
                if kind == LogoutKind::CloseGame {
                    player.account = None;
                }
            }
            GameAction::RequestCharacterList => {
                log::debug!("[{connection_id}] Character list requested");
            }
            GameAction::CreateCharacter { name, class } => {
                log::info!("[{connection_id}] Create character {name} (class {class})");
            }
            GameAction::DeleteCharacter { name, .. } => {
                log::info!("[{connection_id}] Delete character {name}");
            }
            GameAction::SelectCharacter { name } => {
                log::info!("[{connection_id}] Selected character {name}");
                player.character = Some(name);
            }
            GameAction::EnterEvent { event_kind, level } => {
                log::info!("[{connection_id}] Enter event {event_kind} level {level}");
            }
            GameAction::EventRemainTime {
                event_type,
                item_level,
            } => {
                log::debug!(
                    "[{connection_id}] Remaining time of event {event_type} (level {item_level})"
                );
            }
        }
        Ok(())
    }
}
