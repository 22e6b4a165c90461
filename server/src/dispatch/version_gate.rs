//! Keeps the registries consistent with the negotiated client version and
//! with the set of handlers switched off by the operator.

use std::sync::{Arc, Mutex, PoisonError};

use dashmap::DashSet;
use protocol::ClientVersion;

use super::descriptor::HandlerId;
use super::handler::{HandlerFactory, HandlerPool, PacketHandler, RegisteredHandler};
use super::registry::{Removal, StrategyRegistry};
use crate::error::{Result, ServerError};

/// Receives changes of the negotiated client version. Called directly by
/// the session/login side, no event bus involved.
pub trait ClientVersionObserver: Send + Sync {
    fn on_client_version_changed(&self, version: ClientVersion);
}

/// Owns the handler catalog and drives (de)activation in the main registry
/// and in every group's nested registry.
pub struct VersionGate {
    catalog: Vec<HandlerFactory>,
    pool: HandlerPool,
    registry: Arc<StrategyRegistry>,
    disabled: DashSet<HandlerId>,
    /// Held for the whole of every registry update; also the source of truth
    /// for the active version.
    version: Mutex<ClientVersion>,
}

impl VersionGate {
    #[must_use]
    pub fn new(catalog: Vec<HandlerFactory>, version: ClientVersion) -> Self {
        Self {
            catalog,
            pool: HandlerPool::new(),
            registry: Arc::new(StrategyRegistry::new("main", version)),
            disabled: DashSet::new(),
            version: Mutex::new(version),
        }
    }

    #[must_use]
    pub fn registry(&self) -> Arc<StrategyRegistry> {
        Arc::clone(&self.registry)
    }

    #[must_use]
    pub fn catalog(&self) -> &[HandlerFactory] {
        &self.catalog
    }

    #[must_use]
    pub fn pool(&self) -> &HandlerPool {
        &self.pool
    }

    #[must_use]
    pub fn current_version(&self) -> ClientVersion {
        *self.version.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn is_enabled(&self, id: &str) -> bool {
        self.factory(id)
            .is_some_and(|factory| !self.disabled.contains(&factory.descriptor.id))
    }

    /// Registers every handler supporting the configured version and
    /// initializes the groups. Must run once before dispatching.
    pub fn initialize(&self) {
        let version = self.version.lock().unwrap_or_else(PoisonError::into_inner);
        log::info!(
            "Initializing {} handlers for client {}",
            self.catalog.len(),
            *version
        );
        self.apply(*version);
    }

    /// Switches a handler on or off at runtime.
    pub fn set_enabled(&self, id: &str, enabled: bool) -> Result<()> {
        let factory = *self
            .factory(id)
            .ok_or_else(|| ServerError::UnknownHandler(id.to_string()))?;
        let handler_id = factory.descriptor.id;
        let version = self.version.lock().unwrap_or_else(PoisonError::into_inner);

        if enabled {
            if self.disabled.remove(&handler_id).is_none() {
                return Ok(());
            }
            log::info!("Enabled handler {}", factory.descriptor);
            if !factory.descriptor.supports(&version) {
                return Ok(());
            }
            let entry = self.pool.registered(&factory);
            match factory.descriptor.group {
                None => {
                    self.registry.register(entry);
                    // A group host coming back needs its members again.
                    if let Some(group) = self.pool.get_or_construct(&factory).as_group() {
                        group.initialize(*version, self.members(Some(group.opcode()), *version));
                    }
                }
                Some(opcode) => {
                    for host in self.group_hosts(opcode) {
                        if let Some(group) = host.as_group() {
                            group.registry().register(entry.clone());
                        }
                    }
                }
            }
        } else {
            if !self.disabled.insert(handler_id) {
                return Ok(());
            }
            log::info!("Disabled handler {}", factory.descriptor);
            match factory.descriptor.group {
                None => {
                    self.registry.deregister(handler_id);
                }
                Some(opcode) => {
                    for host in self.group_hosts(opcode) {
                        let Some(group) = host.as_group() else {
                            continue;
                        };
                        if group.registry().deregister(handler_id)
                            == (Removal::Deactivated { successor: None })
                        {
                            log::warn!(
                                "Group {:02X} has no handler left for sub-opcode {:02X}",
                                opcode,
                                factory.descriptor.key
                            );
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn factory(&self, id: &str) -> Option<&HandlerFactory> {
        self.catalog
            .iter()
            .find(|factory| factory.descriptor.id.as_str() == id)
    }

    /// Enabled catalog entries of `group` (top level for `None`) supporting `version`.
    fn members(&self, group: Option<u8>, version: ClientVersion) -> Vec<Arc<RegisteredHandler>> {
        self.catalog
            .iter()
            .filter(|factory| {
                factory.descriptor.belongs_to(group)
                    && factory.descriptor.supports(&version)
                    && !self.disabled.contains(&factory.descriptor.id)
            })
            .map(|factory| self.pool.registered(factory))
            .collect()
    }

    /// Top-level handler instances hosting the group `opcode`.
    fn group_hosts(&self, opcode: u8) -> Vec<Arc<dyn PacketHandler>> {
        self.catalog
            .iter()
            .filter(|factory| factory.descriptor.group.is_none() && factory.descriptor.key == opcode)
            .map(|factory| self.pool.get_or_construct(factory))
            .filter(|handler| handler.as_group().is_some())
            .collect()
    }

    fn apply(&self, version: ClientVersion) {
        let report = self.registry.reconcile(version, self.members(None, version));
        log::debug!(
            "Main registry: {} added, {} removed, {} opcodes switched",
            report.added.len(),
            report.removed.len(),
            report.switched.len()
        );

        for factory in self.catalog.iter().filter(|factory| {
            factory.descriptor.group.is_none()
                && factory.descriptor.supports(&version)
                && !self.disabled.contains(&factory.descriptor.id)
        }) {
            let handler = self.pool.get_or_construct(factory);
            if let Some(group) = handler.as_group() {
                group.initialize(version, self.members(Some(group.opcode()), version));
            }
        }
    }
}

impl ClientVersionObserver for VersionGate {
    fn on_client_version_changed(&self, version: ClientVersion) {
        let mut current = self.version.lock().unwrap_or_else(PoisonError::into_inner);
        log::info!("Client version changed from {} to {}", *current, version);
        *current = version;
        self.apply(version);
    }
}
