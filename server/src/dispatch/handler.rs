//! Handler trait, the static registration table entry and the instance pool.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use super::descriptor::{HandlerDescriptor, HandlerId};
use super::group::GroupDispatcher;
use crate::game::PlayerContext;

/// Decodes one kind of packet and forwards it to the game logic.
///
/// Instances are shared by every connection and must not keep per-request
/// state; everything a request needs lives in the [`PlayerContext`].
#[async_trait]
pub trait PacketHandler: Send + Sync + 'static {
    /// Handles a complete packet, header included.
    async fn handle(&self, ctx: &mut PlayerContext, packet: &[u8]) -> anyhow::Result<()>;

    /// Returns the nested dispatcher if this handler fans out by sub-opcode.
    fn as_group(&self) -> Option<&GroupDispatcher> {
        None
    }
}

/// Constructor of a handler instance.
pub type HandlerConstructor = fn() -> Arc<dyn PacketHandler>;

/// One row of the handler catalog: metadata plus how to build the handler.
#[derive(Clone, Copy)]
pub struct HandlerFactory {
    pub descriptor: HandlerDescriptor,
    pub construct: HandlerConstructor,
}

impl HandlerFactory {
    #[must_use]
    pub const fn new(descriptor: HandlerDescriptor, construct: HandlerConstructor) -> Self {
        Self {
            descriptor,
            construct,
        }
    }
}

impl std::fmt::Debug for HandlerFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerFactory")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// A handler instance together with the descriptor it was registered with.
pub struct RegisteredHandler {
    pub descriptor: HandlerDescriptor,
    pub handler: Arc<dyn PacketHandler>,
}

impl RegisteredHandler {
    #[must_use]
    pub fn new(descriptor: HandlerDescriptor, handler: Arc<dyn PacketHandler>) -> Self {
        Self {
            descriptor,
            handler,
        }
    }

    #[must_use]
    pub fn id(&self) -> HandlerId {
        self.descriptor.id
    }
}

impl std::fmt::Debug for RegisteredHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredHandler")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Owns handler instances, constructing each catalog entry at most once.
#[derive(Clone, Default)]
pub struct HandlerPool {
    instances: Arc<DashMap<HandlerId, Arc<dyn PacketHandler>>>,
}

impl HandlerPool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached instance for `factory`, constructing it on first use.
    pub fn get_or_construct(&self, factory: &HandlerFactory) -> Arc<dyn PacketHandler> {
        self.instances
            .entry(factory.descriptor.id)
            .or_insert_with(|| {
                log::debug!("Constructing handler {}", factory.descriptor);
                (factory.construct)()
            })
            .clone()
    }

    /// Instance for `factory` wrapped for registration.
    pub fn registered(&self, factory: &HandlerFactory) -> Arc<RegisteredHandler> {
        Arc::new(RegisteredHandler::new(
            factory.descriptor,
            self.get_or_construct(factory),
        ))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
