//! RELAY: optional onion-style wrapping for sender anonymity. Each
//! relay layer is `{next_hop: {addr, endpoint}, inner: Packet}`,
//! encrypted for the corresponding hop. A hop whose own address
//! matches `next_hop.addr` unwraps and re-injects `inner` as though it
//! had just arrived over the transport (it was encrypted for this
//! node's identity); any other hop forwards `inner` on raw, unchanged.

use async_trait::async_trait;

use warren_core::codec::{Cursor, Writer};
use warren_core::message::TYPE_RELAY;
use warren_core::{Address, Message};

use crate::service::{Service, ServiceCtx};

pub struct RelayLayer {
    pub next_hop_addr: Address,
    pub next_hop_endpoint: String,
    pub inner_packet: Vec<u8>,
}

pub fn encode_relay_layer(layer: &RelayLayer) -> Vec<u8> {
    let mut w = Writer::new();
    w.write_bytes(layer.next_hop_addr.as_bytes());
    w.write_u16_be(layer.next_hop_endpoint.len() as u16);
    w.write_bytes(layer.next_hop_endpoint.as_bytes());
    w.write_bytes(&layer.inner_packet);
    w.into_bytes()
}

pub fn decode_relay_layer(payload: &[u8]) -> Option<RelayLayer> {
    let mut c = Cursor::new(payload);
    let addr_bytes = c.read_bytes(32).ok()?;
    let next_hop_addr = Address::from_bytes(addr_bytes.try_into().unwrap());
    let len = c.read_u16_be().ok()?;
    let endpoint_bytes = c.read_bytes(len as usize).ok()?;
    let next_hop_endpoint = String::from_utf8_lossy(endpoint_bytes).into_owned();
    let inner_packet = c.read_rest().to_vec();
    Some(RelayLayer {
        next_hop_addr,
        next_hop_endpoint,
        inner_packet,
    })
}

#[async_trait]
pub trait RelayForwarder: Send + Sync {
    /// Sends the still-encrypted inner packet on to `next_hop`,
    /// learning `endpoint` for it first if one was carried.
    async fn forward(&self, next_hop: Address, endpoint: String, inner_packet: Vec<u8>);

    /// Unwraps a layer addressed to this node by feeding the inner
    /// packet back through the node's own receive pipeline.
    async fn reinject(&self, inner_packet: Vec<u8>);
}

pub struct RelayService {
    forwarder: Box<dyn RelayForwarder>,
}

impl RelayService {
    pub fn new(forwarder: Box<dyn RelayForwarder>) -> Self {
        Self { forwarder }
    }
}

#[async_trait]
impl Service for RelayService {
    fn name(&self) -> &'static str {
        "relay"
    }

    fn handles(&self) -> &'static [u16] {
        &[TYPE_RELAY]
    }

    async fn respond(&self, ctx: &ServiceCtx, request: Message) -> Option<Message> {
        if request.header.msg_type != TYPE_RELAY || request.payload.is_empty() {
            return None;
        }
        let layer = decode_relay_layer(&request.payload)?;
        if layer.next_hop_addr == ctx.local {
            self.forwarder.reinject(layer.inner_packet).await;
        } else {
            self.forwarder
                .forward(layer.next_hop_addr, layer.next_hop_endpoint, layer.inner_packet)
                .await;
        }
        // RELAY is fire-and-forget at each hop: no response travels
        // back along the relay chain itself.
        None
    }
}
