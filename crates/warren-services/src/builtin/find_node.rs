//! FIND_NODE/FIND_NODE_RESP: the routing-table lookup primitive the
//! iterative lookup engine drives.

use std::sync::Arc;

use async_trait::async_trait;

use warren_core::codec::{Cursor, Writer};
use warren_core::message::{TYPE_FIND_NODE, TYPE_FIND_NODE_RESP};
use warren_core::{Address, Message};
use warren_routing::RoutingTable;

use crate::resolver::EndpointResolver;
use crate::service::{Service, ServiceCtx};

const RESULT_COUNT: usize = 20;

/// Encodes a `list-of-{addr, endpoint}` body: each entry is a 32-byte
/// address followed by a 16-bit length-prefixed UTF-8 endpoint.
pub fn encode_entries(entries: &[(Address, String)]) -> Vec<u8> {
    let mut w = Writer::new();
    for (addr, endpoint) in entries {
        w.write_bytes(addr.as_bytes());
        w.write_u16_be(endpoint.len() as u16);
        w.write_bytes(endpoint.as_bytes());
    }
    w.into_bytes()
}

/// Decodes a `list-of-{addr, endpoint}` body, stopping at the first
/// malformed or truncated entry rather than failing the whole message.
pub fn decode_entries(payload: &[u8]) -> Vec<(Address, String)> {
    let mut c = Cursor::new(payload);
    let mut out = Vec::new();
    while c.remaining() > 0 {
        let Ok(addr_bytes) = c.read_bytes(32) else {
            break;
        };
        let addr = Address::from_bytes(addr_bytes.try_into().unwrap());
        let Ok(len) = c.read_u16_be() else {
            break;
        };
        let Ok(endpoint_bytes) = c.read_bytes(len as usize) else {
            break;
        };
        out.push((addr, String::from_utf8_lossy(endpoint_bytes).into_owned()));
    }
    out
}

pub struct FindNodeService {
    table: Arc<RoutingTable>,
    resolver: Arc<dyn EndpointResolver>,
}

impl FindNodeService {
    pub fn new(table: Arc<RoutingTable>, resolver: Arc<dyn EndpointResolver>) -> Self {
        Self { table, resolver }
    }
}

#[async_trait]
impl Service for FindNodeService {
    fn name(&self) -> &'static str {
        "find_node"
    }

    fn handles(&self) -> &'static [u16] {
        &[TYPE_FIND_NODE, TYPE_FIND_NODE_RESP]
    }

    async fn respond(&self, _ctx: &ServiceCtx, request: Message) -> Option<Message> {
        if request.header.msg_type != TYPE_FIND_NODE || request.payload.len() != 32 {
            return None;
        }
        let target = Address::from_bytes(request.payload[..32].try_into().unwrap());
        let closest = self.table.closest(&target, RESULT_COUNT);
        let entries: Vec<(Address, String)> = closest
            .into_iter()
            .map(|addr| {
                let endpoint = self.resolver.resolve(addr).unwrap_or_default();
                (addr, endpoint)
            })
            .collect();
        Some(Message::new(
            TYPE_FIND_NODE_RESP,
            request.header.tx_id,
            request.header.receiver,
            request.header.sender,
            encode_entries(&entries),
        ))
    }
}
