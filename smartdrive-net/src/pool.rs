//! Connection pool & active-validator tracker: a process-wide registry
//! `address -> {socket, last_pong}`. Each peer owns an outbound queue
//! drained by its own writer task, so a slow or wedged peer can only ever
//! back up its own queue — never block a broadcast to the others. One task
//! per connection, one shared, short-critical-section lock guarding the
//! registry itself.

use std::collections::HashMap;
use std::time::Instant;

use parking_lot::Mutex;
use smartdrive_types::{Address, ConnectionInfo};
use tokio::sync::mpsc;

struct PeerEntry {
    connection: ConnectionInfo,
    outbox: mpsc::UnboundedSender<Vec<u8>>,
    last_pong: Instant,
}

/// A live TCP peer's outbound half. Cloning is cheap; every clone enqueues
/// onto the same writer task.
#[derive(Clone)]
pub struct PeerHandle {
    pub address: Address,
    pub connection: ConnectionInfo,
    outbox: mpsc::UnboundedSender<Vec<u8>>,
}

impl PeerHandle {
    /// Enqueues `frame` for send. Fails only if the peer's writer task has
    /// already exited (connection torn down).
    pub fn send(&self, frame: Vec<u8>) -> bool {
        self.outbox.send(frame).is_ok()
    }
}

#[derive(Default)]
pub struct ConnectionPool {
    peers: Mutex<HashMap<Address, PeerEntry>>,
}

impl ConnectionPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, address: Address, connection: ConnectionInfo, outbox: mpsc::UnboundedSender<Vec<u8>>) {
        self.peers.lock().insert(
            address.clone(),
            PeerEntry { connection, outbox, last_pong: Instant::now() },
        );
    }

    pub fn remove(&self, address: &Address) -> bool {
        self.peers.lock().remove(address).is_some()
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.peers.lock().contains_key(address)
    }

    pub fn get(&self, address: &Address) -> Option<PeerHandle> {
        let peers = self.peers.lock();
        peers.get(address).map(|entry| PeerHandle {
            address: address.clone(),
            connection: entry.connection.clone(),
            outbox: entry.outbox.clone(),
        })
    }

    /// A copy-on-read snapshot of every connected peer, for iteration
    /// outside the lock.
    pub fn snapshot(&self) -> Vec<PeerHandle> {
        self.peers
            .lock()
            .iter()
            .map(|(address, entry)| PeerHandle {
                address: address.clone(),
                connection: entry.connection.clone(),
                outbox: entry.outbox.clone(),
            })
            .collect()
    }

    /// Enqueues `frame` on every peer; peers with a closed outbox are skipped.
    pub fn broadcast(&self, frame: &[u8]) {
        for peer in self.snapshot() {
            peer.send(frame.to_vec());
        }
    }

    pub fn record_pong(&self, address: &Address) {
        if let Some(entry) = self.peers.lock().get_mut(address) {
            entry.last_pong = Instant::now();
        }
    }

    /// Evicts every peer whose last pong is older than `timeout_secs`,
    /// returning the evicted addresses so the caller can also close sockets
    /// tracked elsewhere.
    pub fn evict_stale(&self, timeout_secs: u64) -> Vec<Address> {
        let timeout = std::time::Duration::from_secs(timeout_secs);
        let now = Instant::now();
        let mut peers = self.peers.lock();
        let stale: Vec<Address> = peers
            .iter()
            .filter(|(_, entry)| now.duration_since(entry.last_pong) > timeout)
            .map(|(address, _)| address.clone())
            .collect();
        for address in &stale {
            peers.remove(address);
        }
        stale
    }

    /// The current live set, excluding `self_address`.
    pub fn active_validators(&self, self_address: &Address) -> Vec<Address> {
        self.peers
            .lock()
            .keys()
            .filter(|a| *a != self_address)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn() -> ConnectionInfo {
        ConnectionInfo { ip: "127.0.0.1".into(), port: 9000 }
    }

    #[test]
    fn excludes_self_from_active_validators() {
        let pool = ConnectionPool::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let me = Address::new("me");
        let other = Address::new("other");
        pool.insert(me.clone(), conn(), tx.clone());
        pool.insert(other.clone(), conn(), tx);
        assert_eq!(pool.active_validators(&me), vec![other]);
    }

    #[test]
    fn evicts_peers_past_timeout() {
        let pool = ConnectionPool::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let addr = Address::new("stale");
        pool.insert(addr.clone(), conn(), tx);
        let evicted = pool.evict_stale(0);
        assert_eq!(evicted, vec![addr.clone()]);
        assert!(!pool.contains(&addr));
    }
}
