//! The transport contract. A concrete transport is an external
//! collaborator the node runtime only ever reaches through this trait
//! — real UDP sockets, NAT-traversal plumbing, and anonymized
//! circuits are all out of scope here.

pub mod loopback;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use warren_core::Address;

/// A transport-level endpoint, opaque to everything above this crate
/// (a socket address, a dialable multiaddr, whatever the concrete
/// transport needs to route to a peer).
pub type NetAddr = String;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("no known endpoint for address")]
    Unresolved,

    #[error("transport send failed: {0}")]
    SendFailed(String),
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends a raw (already packet-encrypted) buffer to `to`.
    async fn send(&self, to: Address, bytes: Vec<u8>) -> Result<(), TransportError>;

    /// Registers the channel the node pumps incoming raw packets into.
    /// Called once during node startup.
    fn listen(&self) -> mpsc::Receiver<(Address, Vec<u8>)>;

    /// Informs the transport that `addr` was seen at `netaddr`, so it
    /// can cache the endpoint for future `resolve` calls.
    fn learn(&self, addr: Address, netaddr: NetAddr) -> Result<(), TransportError>;

    /// Resolves `addr` to a transport-level endpoint, if known.
    fn resolve(&self, addr: Address) -> Option<NetAddr>;

    /// The endpoint this transport would currently advertise for
    /// itself (e.g. after a NAT rebinding).
    fn new_address(&self) -> Option<String>;

    /// Samples up to `n` addresses the transport has discovered
    /// out-of-band (e.g. via multicast), used to seed routing.
    fn sample(&self, n: usize) -> Vec<Address>;

    /// Invoked once per epoch tick for transport-level maintenance
    /// (endpoint refresh, stale-peer eviction, etc).
    async fn epoch(&self);
}
