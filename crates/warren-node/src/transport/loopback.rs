//! In-process `Transport` backed by a shared registry of channels.
//! Scaffolding for tests and the demo CLI — not a substitute for a
//! real network transport.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::mpsc;

use warren_core::Address;

use super::{NetAddr, Transport, TransportError};

type Registry = Arc<DashMap<Address, mpsc::Sender<(Address, Vec<u8>)>>>;

/// A shared switchboard every [`LoopbackTransport`] registers into.
#[derive(Clone, Default)]
pub struct LoopbackNetwork {
    registry: Registry,
}

impl LoopbackNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(&self, addr: Address) -> LoopbackTransport {
        let (tx, rx_holder) = mpsc::channel(256);
        self.registry.insert(addr, tx);
        LoopbackTransport {
            local: addr,
            network: self.clone(),
            rx: std::sync::Mutex::new(Some(rx_holder)),
            learned: DashMap::new(),
        }
    }
}

pub struct LoopbackTransport {
    local: Address,
    network: LoopbackNetwork,
    rx: std::sync::Mutex<Option<mpsc::Receiver<(Address, Vec<u8>)>>>,
    learned: DashMap<Address, NetAddr>,
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn send(&self, to: Address, bytes: Vec<u8>) -> Result<(), TransportError> {
        let sender = self
            .network
            .registry
            .get(&to)
            .ok_or(TransportError::Unresolved)?
            .clone();
        sender
            .send((self.local, bytes))
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }

    fn listen(&self) -> mpsc::Receiver<(Address, Vec<u8>)> {
        self.rx
            .lock()
            .unwrap()
            .take()
            .expect("listen() called more than once on a LoopbackTransport")
    }

    fn learn(&self, addr: Address, netaddr: NetAddr) -> Result<(), TransportError> {
        self.learned.insert(addr, netaddr);
        Ok(())
    }

    fn resolve(&self, addr: Address) -> Option<NetAddr> {
        if let Some(netaddr) = self.learned.get(&addr) {
            return Some(netaddr.clone());
        }
        self.network
            .registry
            .contains_key(&addr)
            .then(|| addr.to_base32())
    }

    fn new_address(&self) -> Option<String> {
        Some(self.local.to_base32())
    }

    fn sample(&self, n: usize) -> Vec<Address> {
        self.network
            .registry
            .iter()
            .map(|e| *e.key())
            .filter(|a| *a != self.local)
            .take(n)
            .collect()
    }

    async fn epoch(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::from_bytes([b; 32])
    }

    #[tokio::test]
    async fn send_delivers_to_the_right_peer() {
        let net = LoopbackNetwork::new();
        let a = net.join(addr(1));
        let b = net.join(addr(2));
        let mut b_rx = b.listen();

        a.send(addr(2), vec![1, 2, 3]).await.unwrap();
        let (from, bytes) = b_rx.recv().await.unwrap();
        assert_eq!(from, addr(1));
        assert_eq!(bytes, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn learn_overrides_resolved_endpoint() {
        let net = LoopbackNetwork::new();
        let a = net.join(addr(1));
        let _b = net.join(addr(2));
        assert_eq!(a.resolve(addr(2)), Some(addr(2).to_base32()));

        a.learn(addr(2), "10.0.0.2:4000".to_string()).unwrap();
        assert_eq!(a.resolve(addr(2)), Some("10.0.0.2:4000".to_string()));
    }

    #[tokio::test]
    async fn send_to_unknown_peer_fails() {
        let net = LoopbackNetwork::new();
        let a = net.join(addr(1));
        assert!(matches!(
            a.send(addr(99), vec![]).await,
            Err(TransportError::Unresolved)
        ));
    }
}
