//! Client registry
//!
//! Tracks connected clients so the server can enforce its connection limit.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::net::SocketAddr;

/// Bookkeeping for one connected client.
#[derive(Debug, Clone)]
pub struct ClientSession {
    addr: SocketAddr,
    connected_at: DateTime<Utc>,
    requests: u64,
}

impl ClientSession {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            connected_at: Utc::now(),
            requests: 0,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }

    pub fn requests(&self) -> u64 {
        self.requests
    }

    pub fn record_request(&mut self) {
        self.requests += 1;
    }
}

/// Registry for tracking active clients
pub struct ClientRegistry {
    clients: HashMap<SocketAddr, ClientSession>,
    max_clients: usize,
}

impl ClientRegistry {
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: HashMap::new(),
            max_clients,
        }
    }

    /// Registers `addr` unless the registry is full. Returns whether it was added.
    pub fn try_register(&mut self, addr: SocketAddr) -> bool {
        if self.clients.len() >= self.max_clients {
            return false;
        }
        self.clients.insert(addr, ClientSession::new(addr));
        true
    }

    pub fn remove(&mut self, addr: &SocketAddr) -> Option<ClientSession> {
        self.clients.remove(addr)
    }

    pub fn get(&self, addr: &SocketAddr) -> Option<&ClientSession> {
        self.clients.get(addr)
    }

    pub fn get_mut(&mut self, addr: &SocketAddr) -> Option<&mut ClientSession> {
        self.clients.get_mut(addr)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn max_clients(&self) -> usize {
        self.max_clients
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    #[test]
    fn test_limit_is_enforced() {
        let mut registry = ClientRegistry::new(2);
        assert!(registry.try_register(addr(1)));
        assert!(registry.try_register(addr(2)));
        assert!(!registry.try_register(addr(3)));
        assert_eq!(registry.len(), 2);

        registry.remove(&addr(1));
        assert!(registry.try_register(addr(3)));
        assert!(registry.get(&addr(1)).is_none());
    }

    #[test]
    fn test_request_counter() {
        let mut registry = ClientRegistry::new(1);
        registry.try_register(addr(9));
        registry.get_mut(&addr(9)).unwrap().record_request();
        let session = registry.get(&addr(9)).unwrap();
        assert_eq!(session.requests(), 1);
        assert_eq!(session.addr(), addr(9));
    }
}
