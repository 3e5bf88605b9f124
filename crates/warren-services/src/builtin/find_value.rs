//! FIND_VALUE/FIND_VALUE_RESP: returns a stored value when present,
//! otherwise falls back to the same closest-node list FIND_NODE_RESP
//! carries.

use std::sync::Arc;

use async_trait::async_trait;

use warren_core::message::{TYPE_FIND_VALUE, TYPE_FIND_VALUE_RESP};
use warren_core::{Address, Message};
use warren_routing::RoutingTable;

use super::find_node::{decode_entries, encode_entries};
use super::store::ValueStore;
use crate::resolver::EndpointResolver;
use crate::service::{Service, ServiceCtx};

const RESULT_COUNT: usize = 20;
const TAG_NODES: u8 = 0;
const TAG_VALUE: u8 = 1;

pub enum FindValueResult {
    Value(Vec<u8>),
    Nodes(Vec<(Address, String)>),
}

pub fn decode_response(payload: &[u8]) -> Option<FindValueResult> {
    match payload.first()? {
        &TAG_VALUE => Some(FindValueResult::Value(payload[1..].to_vec())),
        &TAG_NODES => Some(FindValueResult::Nodes(decode_entries(&payload[1..]))),
        _ => None,
    }
}

pub struct FindValueService {
    table: Arc<RoutingTable>,
    store: Box<dyn ValueStore>,
    resolver: Arc<dyn EndpointResolver>,
}

impl FindValueService {
    pub fn new(
        table: Arc<RoutingTable>,
        store: Box<dyn ValueStore>,
        resolver: Arc<dyn EndpointResolver>,
    ) -> Self {
        Self {
            table,
            store,
            resolver,
        }
    }
}

#[async_trait]
impl Service for FindValueService {
    fn name(&self) -> &'static str {
        "find_value"
    }

    fn handles(&self) -> &'static [u16] {
        &[TYPE_FIND_VALUE, TYPE_FIND_VALUE_RESP]
    }

    async fn respond(&self, _ctx: &ServiceCtx, request: Message) -> Option<Message> {
        if request.header.msg_type != TYPE_FIND_VALUE || request.payload.is_empty() {
            return None;
        }
        let key = &request.payload;
        let mut out = Vec::new();
        if let Some(value) = self.store.get(key) {
            out.push(TAG_VALUE);
            out.extend_from_slice(&value);
        } else {
            let target_bytes: [u8; 32] = {
                let mut b = [0u8; 32];
                let n = key.len().min(32);
                b[..n].copy_from_slice(&key[..n]);
                b
            };
            let target = Address::from_bytes(target_bytes);
            let entries: Vec<(Address, String)> = self
                .table
                .closest(&target, RESULT_COUNT)
                .into_iter()
                .map(|addr| (addr, self.resolver.resolve(addr).unwrap_or_default()))
                .collect();
            out.push(TAG_NODES);
            out.extend_from_slice(&encode_entries(&entries));
        }
        Some(Message::new(
            TYPE_FIND_VALUE_RESP,
            request.header.tx_id,
            request.header.receiver,
            request.header.sender,
            out,
        ))
    }
}
