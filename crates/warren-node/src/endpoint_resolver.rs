//! Adapts a [`Transport`] to `warren_services::EndpointResolver`, so
//! services can resolve a peer's endpoint without depending on this
//! crate's `Transport`/`Connector` types directly.

use std::sync::Arc;

use warren_core::Address;
use warren_services::EndpointResolver;

use crate::transport::Transport;

pub struct TransportResolver(Arc<dyn Transport>);

impl TransportResolver {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self(transport)
    }
}

impl EndpointResolver for TransportResolver {
    fn resolve(&self, addr: Address) -> Option<String> {
        self.0.resolve(addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::loopback::LoopbackNetwork;

    #[test]
    fn resolves_through_the_underlying_transport() {
        let net = LoopbackNetwork::new();
        let a = net.join(Address::from_bytes([1; 32]));
        let b = Address::from_bytes([2; 32]);
        net.join(b);
        let resolver = TransportResolver::new(Arc::new(a));
        assert!(resolver.resolve(b).is_some());
    }
}
