//! A small resolve/learn cache sitting in front of a [`Transport`], so
//! repeated sends to the same address don't all pay the transport's
//! resolution cost.

use std::sync::Mutex;

use dashmap::DashMap;

use warren_core::Address;

use crate::transport::Transport;

pub struct Connector {
    transport: std::sync::Arc<dyn Transport>,
    cache: DashMap<Address, String>,
    last_learned: Mutex<Vec<Address>>,
}

impl Connector {
    pub fn new(transport: std::sync::Arc<dyn Transport>) -> Self {
        Self {
            transport,
            cache: DashMap::new(),
            last_learned: Mutex::new(Vec::new()),
        }
    }

    pub fn resolve(&self, addr: Address) -> Option<String> {
        if let Some(endpoint) = self.cache.get(&addr) {
            return Some(endpoint.clone());
        }
        let endpoint = self.transport.resolve(addr)?;
        self.cache.insert(addr, endpoint.clone());
        Some(endpoint)
    }

    pub fn learn(&self, addr: Address, netaddr: String) {
        if self.transport.learn(addr, netaddr.clone()).is_err() {
            return;
        }
        self.cache.insert(addr, netaddr);
        self.last_learned.lock().unwrap().push(addr);
    }

    pub fn transport(&self) -> &std::sync::Arc<dyn Transport> {
        &self.transport
    }
}
