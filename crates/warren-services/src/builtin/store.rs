//! STORE/STORE_RESP: stashes a key/value pair in an injected
//! [`ValueStore`]. Persistence is explicitly out of scope, so only an
//! in-memory reference store ships with this crate.

use async_trait::async_trait;
use dashmap::DashMap;

use warren_core::message::{TYPE_STORE, TYPE_STORE_RESP};
use warren_core::Message;

use crate::service::{Service, ServiceCtx};

pub trait ValueStore: Send + Sync {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;
    fn put(&self, key: Vec<u8>, value: Vec<u8>);
}

#[derive(Default)]
pub struct MemoryStore {
    inner: DashMap<Vec<u8>, Vec<u8>>,
}

impl ValueStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.inner.get(key).map(|v| v.clone())
    }

    fn put(&self, key: Vec<u8>, value: Vec<u8>) {
        self.inner.insert(key, value);
    }
}

/// STORE payload layout: a 2-byte big-endian key length, the key
/// bytes, then the value (rest of the payload).
fn split_key_value(payload: &[u8]) -> Option<(&[u8], &[u8])> {
    if payload.len() < 2 {
        return None;
    }
    let key_len = u16::from_be_bytes([payload[0], payload[1]]) as usize;
    let rest = &payload[2..];
    if rest.len() < key_len {
        return None;
    }
    Some(rest.split_at(key_len))
}

pub struct StoreService {
    store: Box<dyn ValueStore>,
}

impl StoreService {
    pub fn new(store: Box<dyn ValueStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Service for StoreService {
    fn name(&self) -> &'static str {
        "store"
    }

    fn handles(&self) -> &'static [u16] {
        &[TYPE_STORE, TYPE_STORE_RESP]
    }

    async fn respond(&self, _ctx: &ServiceCtx, request: Message) -> Option<Message> {
        if request.header.msg_type != TYPE_STORE {
            return None;
        }
        let ok = match split_key_value(&request.payload) {
            Some((key, value)) => {
                self.store.put(key.to_vec(), value.to_vec());
                true
            }
            None => false,
        };
        Some(Message::new(
            TYPE_STORE_RESP,
            request.header.tx_id,
            request.header.receiver,
            request.header.sender,
            vec![ok as u8],
        ))
    }
}
