use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::dispatch::DispatchOutcome;

#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub connection_id: u64,
    pub peer: SocketAddr,
    pub connected_at: Instant,
    pub packets_handled: u64,
    pub packets_dropped: u64,
}

impl ConnectionInfo {
    fn new(connection_id: u64, peer: SocketAddr) -> Self {
        Self {
            connection_id,
            peer,
            connected_at: Instant::now(),
            packets_handled: 0,
            packets_dropped: 0,
        }
    }
}

/// Live connections of the gateway.
#[derive(Clone, Default)]
pub struct SessionManager {
    // connection_id -> ConnectionInfo
    connections: Arc<DashMap<u64, ConnectionInfo>>,
    next_id: Arc<AtomicU64>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new connection and returns its id.
    pub fn open(&self, peer: SocketAddr) -> u64 {
        let connection_id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.connections
            .insert(connection_id, ConnectionInfo::new(connection_id, peer));
        log::info!("Opened connection {} from {}", connection_id, peer);
        connection_id
    }

    pub fn close(&self, connection_id: u64) {
        if let Some((_, info)) = self.connections.remove(&connection_id) {
            log::info!(
                "Closed connection {} from {} after {:?} ({} handled, {} dropped)",
                connection_id,
                info.peer,
                info.connected_at.elapsed(),
                info.packets_handled,
                info.packets_dropped
            );
        }
    }

    pub fn record(&self, connection_id: u64, outcome: DispatchOutcome) {
        if let Some(mut info) = self.connections.get_mut(&connection_id) {
            if outcome == DispatchOutcome::Handled {
                info.packets_handled += 1;
            } else {
                info.packets_dropped += 1;
            }
        }
    }

    pub fn get(&self, connection_id: u64) -> Option<ConnectionInfo> {
        self.connections.get(&connection_id).map(|c| c.clone())
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer() -> SocketAddr {
        "127.0.0.1:50000".parse().unwrap()
    }

    #[test]
    fn test_open_assigns_unique_ids() {
        let manager = SessionManager::new();
        let first = manager.open(peer());
        let second = manager.open(peer());

        assert_ne!(first, second);
        assert_eq!(manager.len(), 2);
    }

    #[test]
    fn test_record_counts_outcomes() {
        let manager = SessionManager::new();
        let id = manager.open(peer());

        manager.record(id, DispatchOutcome::Handled);
        manager.record(id, DispatchOutcome::UnknownOpcode(0x77));
        manager.record(id, DispatchOutcome::Malformed);

        let info = manager.get(id).unwrap();
        assert_eq!(info.packets_handled, 1);
        assert_eq!(info.packets_dropped, 2);
    }

    #[test]
    fn test_close_removes_connection() {
        let manager = SessionManager::new();
        let id = manager.open(peer());
        manager.close(id);

        assert!(manager.get(id).is_none());
        assert!(manager.is_empty());
        // recording on a closed connection is ignored
        manager.record(id, DispatchOutcome::Handled);
    }
}
