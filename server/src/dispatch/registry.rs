//! Per-opcode candidate sets and the effective handler of each opcode.
//!
//! Readers only touch the `effective` slots, one atomically swapped pointer
//! per opcode, so a lookup never blocks and always observes either the old or
//! the new handler. Writers serialize on the candidate state mutex, which is
//! only taken at startup, on version changes and on plugin toggles.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use arc_swap::ArcSwapOption;
use protocol::ClientVersion;

use super::descriptor::HandlerId;
use super::handler::RegisteredHandler;
use super::specificity::more_specific;

const SLOT_COUNT: usize = 256;

/// Result of [`StrategyRegistry::register`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Registration {
    /// The candidate is now effective; its opcode had no effective handler.
    Activated,
    /// The candidate replaced a less specific effective handler.
    Replaced { previous: HandlerId },
    /// The candidate supports the current version but is not preferred.
    Standby,
    /// The candidate does not support the current version.
    Unsupported,
    /// A candidate with the same id is already registered; nothing changed.
    AlreadyRegistered,
}

/// Result of [`StrategyRegistry::deregister`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Removal {
    NotRegistered,
    /// A non-effective candidate was removed.
    Removed,
    /// The effective handler was removed and `successor` took its place.
    Deactivated { successor: Option<HandlerId> },
}

/// Changes applied by [`StrategyRegistry::reconcile`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub removed: Vec<HandlerId>,
    pub added: Vec<HandlerId>,
    /// Keys whose effective handler changed.
    pub switched: Vec<u8>,
}

struct RegistryState {
    version: ClientVersion,
    candidates: BTreeMap<u8, Vec<Arc<RegisteredHandler>>>,
}

/// Strategy registry keyed by opcode (or sub-opcode inside a group).
pub struct StrategyRegistry {
    name: String,
    effective: Box<[ArcSwapOption<RegisteredHandler>]>,
    state: Mutex<RegistryState>,
}

impl StrategyRegistry {
    pub fn new(name: impl Into<String>, version: ClientVersion) -> Self {
        Self {
            name: name.into(),
            effective: (0..SLOT_COUNT).map(|_| ArcSwapOption::empty()).collect(),
            state: Mutex::new(RegistryState {
                version,
                candidates: BTreeMap::new(),
            }),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn slot(&self, key: u8) -> &ArcSwapOption<RegisteredHandler> {
        &self.effective[usize::from(key)]
    }

    /// Effective handler for `key`. Lock-free.
    #[must_use]
    pub fn lookup(&self, key: u8) -> Option<Arc<RegisteredHandler>> {
        self.slot(key).load_full()
    }

    #[must_use]
    pub fn effective_id(&self, key: u8) -> Option<HandlerId> {
        self.slot(key).load().as_ref().map(|entry| entry.id())
    }

    #[must_use]
    pub fn current_version(&self) -> ClientVersion {
        self.state().version
    }

    /// Candidate ids for `key` in registration order.
    #[must_use]
    pub fn candidates(&self, key: u8) -> Vec<HandlerId> {
        self.state()
            .candidates
            .get(&key)
            .map(|entries| entries.iter().map(|entry| entry.id()).collect())
            .unwrap_or_default()
    }

    /// Every registered candidate id, ordered by key then registration.
    #[must_use]
    pub fn registered_ids(&self) -> Vec<HandlerId> {
        self.state()
            .candidates
            .values()
            .flatten()
            .map(|entry| entry.id())
            .collect()
    }

    #[must_use]
    pub fn contains(&self, id: HandlerId) -> bool {
        self.state()
            .candidates
            .values()
            .flatten()
            .any(|entry| entry.id() == id)
    }

    /// Adds a candidate and activates it if it is preferred for the current
    /// client version.
    pub fn register(&self, entry: Arc<RegisteredHandler>) -> Registration {
        let mut state = self.state();
        let version = state.version;
        let key = entry.descriptor.key;
        let candidates = state.candidates.entry(key).or_default();

        if candidates.iter().any(|existing| existing.id() == entry.id()) {
            return Registration::AlreadyRegistered;
        }
        candidates.push(entry.clone());

        if !entry.descriptor.supports(&version) {
            log::trace!(
                "[{}] {} registered but does not support client {}",
                self.name,
                entry.descriptor,
                version
            );
            return Registration::Unsupported;
        }

        let slot = self.slot(key);
        match slot.load_full() {
            None => {
                log::debug!("[{}] Activated {}", self.name, entry.descriptor);
                slot.store(Some(entry));
                Registration::Activated
            }
            Some(current) if more_specific(&entry.descriptor, &current.descriptor) => {
                log::info!(
                    "[{}] Replaced {} with more specific {}",
                    self.name,
                    current.descriptor,
                    entry.descriptor
                );
                slot.store(Some(entry));
                Registration::Replaced {
                    previous: current.id(),
                }
            }
            Some(_) => Registration::Standby,
        }
    }

    /// Removes a candidate. If it was effective, the most specific remaining
    /// candidate supporting the current version is promoted.
    pub fn deregister(&self, id: HandlerId) -> Removal {
        let mut state = self.state();
        let version = state.version;

        let Some((key, index)) = state.candidates.iter().find_map(|(key, entries)| {
            entries
                .iter()
                .position(|entry| entry.id() == id)
                .map(|index| (*key, index))
        }) else {
            return Removal::NotRegistered;
        };

        let remaining = state.candidates.entry(key).or_default();
        let removed = remaining.remove(index);
        let slot = self.slot(key);
        let was_effective = slot
            .load()
            .as_ref()
            .is_some_and(|current| current.id() == removed.id());

        if !was_effective {
            if remaining.is_empty() {
                state.candidates.remove(&key);
            }
            return Removal::Removed;
        }

        let successor = best_candidate(remaining, &version, None);
        match &successor {
            Some(next) => log::info!(
                "[{}] Deactivated {}, promoted {}",
                self.name,
                removed.descriptor,
                next.descriptor
            ),
            None => log::info!(
                "[{}] Deactivated {}, no successor for {:02X}",
                self.name,
                removed.descriptor,
                key
            ),
        }
        let successor_id = successor.as_ref().map(|next| next.id());
        slot.store(successor);
        if remaining.is_empty() {
            state.candidates.remove(&key);
        }

        Removal::Deactivated {
            successor: successor_id,
        }
    }

    /// Switches to `version`: drops candidates that no longer support it,
    /// registers `additions` and swaps every effective slot at most once.
    pub fn reconcile(
        &self,
        version: ClientVersion,
        additions: Vec<Arc<RegisteredHandler>>,
    ) -> ReconcileReport {
        let mut state = self.state();
        state.version = version;

        let mut report = ReconcileReport::default();
        for entries in state.candidates.values_mut() {
            entries.retain(|entry| {
                let keep = entry.descriptor.supports(&version);
                if !keep {
                    report.removed.push(entry.id());
                }
                keep
            });
        }

        for entry in additions {
            let entries = state.candidates.entry(entry.descriptor.key).or_default();
            if entries.iter().any(|existing| existing.id() == entry.id()) {
                continue;
            }
            report.added.push(entry.id());
            entries.push(entry);
        }

        let keys: Vec<u8> = state.candidates.keys().copied().collect();
        for key in keys {
            let slot = self.slot(key);
            let current = slot.load_full();
            let next = state
                .candidates
                .get(&key)
                .and_then(|entries| best_candidate(entries, &version, current.as_ref()));

            let unchanged = match (&current, &next) {
                (Some(current), Some(next)) => current.id() == next.id(),
                (None, None) => true,
                _ => false,
            };
            if unchanged {
                continue;
            }

            match (&current, &next) {
                (Some(current), Some(next)) => log::info!(
                    "[{}] Client {}: {} replaces {}",
                    self.name,
                    version,
                    next.descriptor,
                    current.descriptor
                ),
                (None, Some(next)) => {
                    log::debug!("[{}] Client {}: activated {}", self.name, version, next.descriptor)
                }
                (Some(current), None) => log::info!(
                    "[{}] Client {}: deactivated {}",
                    self.name,
                    version,
                    current.descriptor
                ),
                (None, None) => {}
            }
            slot.store(next);
            report.switched.push(key);
        }

        state.candidates.retain(|_, entries| !entries.is_empty());
        report
    }
}

/// Most specific candidate supporting `version`. `current` is kept on ties so
/// that an effective handler is never swapped for an equally specific one.
fn best_candidate(
    entries: &[Arc<RegisteredHandler>],
    version: &ClientVersion,
    current: Option<&Arc<RegisteredHandler>>,
) -> Option<Arc<RegisteredHandler>> {
    let mut best = current
        .filter(|current| {
            current.descriptor.supports(version)
                && entries.iter().any(|entry| entry.id() == current.id())
        })
        .cloned();

    for entry in entries.iter().filter(|entry| entry.descriptor.supports(version)) {
        let replace = match &best {
            None => true,
            Some(best) => more_specific(&entry.descriptor, &best.descriptor),
        };
        if replace {
            best = Some(entry.clone());
        }
    }
    best
}
