//! Breaks the dependency cycle between a service that needs a peer's
//! current transport endpoint (to embed in a response payload) and the
//! node runtime that owns the transport, the same way
//! `warren_routing::maintenance::Pinger` lets the routing table probe
//! liveness without depending on the transport crate.

use warren_core::Address;

/// Resolves a known address to its current transport-level endpoint.
pub trait EndpointResolver: Send + Sync {
    fn resolve(&self, addr: Address) -> Option<String>;
}
