//! Connection tracking for the UDP transport
//!
//! This module maps socket addresses to the opaque connection ids the simulation
//! uses as player identities. It covers:
//! - Connection lifecycle (join, explicit disconnect, inactivity timeout)
//! - Server capacity limits
//! - Address lookup for routing per-player snapshots
//!
//! Game state is not stored here; the client manager only knows who is connected.

use log::info;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// A connection silent for this long is treated as disconnected.
pub const CLIENT_TIMEOUT: Duration = Duration::from_secs(5);

/// A connected client
#[derive(Debug)]
pub struct Client {
    /// Connection id, also used as the player id
    pub id: u32,
    /// Network address for sending responses
    pub addr: SocketAddr,
    /// Last time we received any packet from this client
    pub last_seen: Instant,
}

impl Client {
    pub fn new(id: u32, addr: SocketAddr) -> Self {
        Self {
            id,
            addr,
            last_seen: Instant::now(),
        }
    }

    /// Marks the client as active now
    pub fn refresh(&mut self) {
        self.last_seen = Instant::now();
    }

    /// Returns true if nothing has been received within `timeout`
    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }
}

/// Manages all connected clients
///
/// Ids are handed out sequentially starting at 1 and never reused within a
/// server run, so a late packet for a departed player can't hit a newcomer.
pub struct ClientManager {
    /// Connected clients indexed by their unique ID
    clients: HashMap<u32, Client>,
    /// Next available client ID for new connections
    next_client_id: u32,
    /// Maximum number of concurrent clients allowed
    max_clients: usize,
}

impl ClientManager {
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: HashMap::new(),
            next_client_id: 1,
            max_clients,
        }
    }

    /// Registers a new connection
    ///
    /// Returns Some(client_id) if successful, None if the server is at capacity.
    pub fn add_client(&mut self, addr: SocketAddr) -> Option<u32> {
        if self.clients.len() >= self.max_clients {
            return None;
        }

        let client_id = self.next_client_id;
        self.next_client_id += 1;

        info!("Client {} connected from {}", client_id, addr);
        self.clients.insert(client_id, Client::new(client_id, addr));

        Some(client_id)
    }

    /// Removes a client. Returns false if it was already gone.
    pub fn remove_client(&mut self, client_id: &u32) -> bool {
        if let Some(client) = self.clients.remove(client_id) {
            info!("Client {} disconnected", client.id);
            true
        } else {
            false
        }
    }

    /// Finds a client ID by network address
    pub fn find_client_by_addr(&self, addr: SocketAddr) -> Option<u32> {
        self.clients
            .iter()
            .find(|(_, client)| client.addr == addr)
            .map(|(id, _)| *id)
    }

    /// Looks up the client at `addr` and refreshes its activity timestamp
    pub fn touch(&mut self, addr: SocketAddr) -> Option<u32> {
        self.clients
            .values_mut()
            .find(|client| client.addr == addr)
            .map(|client| {
                client.refresh();
                client.id
            })
    }

    pub fn get_client_addr(&self, client_id: u32) -> Option<SocketAddr> {
        self.clients.get(&client_id).map(|client| client.addr)
    }

    /// Removes clients that have been silent longer than `timeout`
    ///
    /// Returns the removed ids so the game can run its leave logic for them.
    pub fn check_timeouts(&mut self, timeout: Duration) -> Vec<u32> {
        let timed_out: Vec<u32> = self
            .clients
            .iter()
            .filter(|(_, client)| client.is_timed_out(timeout))
            .map(|(id, _)| *id)
            .collect();

        for client_id in &timed_out {
            self.remove_client(client_id);
        }

        timed_out
    }

    /// Returns the number of currently connected clients
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Returns true if no clients are currently connected
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_addr() -> SocketAddr {
        "127.0.0.1:8080".parse().unwrap()
    }

    fn test_addr2() -> SocketAddr {
        "127.0.0.1:8081".parse().unwrap()
    }

    #[test]
    fn test_client_creation() {
        let addr = test_addr();
        let client = Client::new(1, addr);

        assert_eq!(client.id, 1);
        assert_eq!(client.addr, addr);
        assert!(!client.is_timed_out(Duration::from_secs(1)));
    }

    #[test]
    fn test_client_timeout() {
        let mut client = Client::new(1, test_addr());

        client.last_seen = Instant::now() - Duration::from_secs(2);
        assert!(client.is_timed_out(Duration::from_secs(1)));

        client.refresh();
        assert!(!client.is_timed_out(Duration::from_secs(1)));
    }

    #[test]
    fn test_add_client_assigns_sequential_ids() {
        let mut manager = ClientManager::new(4);

        assert_eq!(manager.add_client(test_addr()), Some(1));
        assert_eq!(manager.add_client(test_addr2()), Some(2));
        assert_eq!(manager.len(), 2);
        assert!(!manager.is_empty());
    }

    #[test]
    fn test_ids_are_not_reused() {
        let mut manager = ClientManager::new(4);

        let first = manager.add_client(test_addr()).unwrap();
        assert!(manager.remove_client(&first));
        let second = manager.add_client(test_addr()).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_capacity_limit() {
        let mut manager = ClientManager::new(1);

        assert!(manager.add_client(test_addr()).is_some());
        assert!(manager.add_client(test_addr2()).is_none());
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_remove_missing_client() {
        let mut manager = ClientManager::new(2);
        assert!(!manager.remove_client(&7));
    }

    #[test]
    fn test_lookup_by_addr_and_id() {
        let mut manager = ClientManager::new(2);
        let id = manager.add_client(test_addr()).unwrap();

        assert_eq!(manager.find_client_by_addr(test_addr()), Some(id));
        assert_eq!(manager.find_client_by_addr(test_addr2()), None);
        assert_eq!(manager.get_client_addr(id), Some(test_addr()));
        assert_eq!(manager.get_client_addr(id + 1), None);
    }

    #[test]
    fn test_touch_refreshes_activity() {
        let mut manager = ClientManager::new(2);
        let id = manager.add_client(test_addr()).unwrap();
        manager.clients.get_mut(&id).unwrap().last_seen =
            Instant::now() - Duration::from_secs(10);

        assert_eq!(manager.touch(test_addr()), Some(id));
        assert!(manager.check_timeouts(CLIENT_TIMEOUT).is_empty());
        assert_eq!(manager.touch(test_addr2()), None);
    }

    #[test]
    fn test_check_timeouts_removes_silent_clients() {
        let mut manager = ClientManager::new(4);
        let stale = manager.add_client(test_addr()).unwrap();
        let fresh = manager.add_client(test_addr2()).unwrap();
        manager.clients.get_mut(&stale).unwrap().last_seen =
            Instant::now() - Duration::from_secs(10);

        let removed = manager.check_timeouts(CLIENT_TIMEOUT);

        assert_eq!(removed, vec![stale]);
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.find_client_by_addr(test_addr2()), Some(fresh));
    }
}
