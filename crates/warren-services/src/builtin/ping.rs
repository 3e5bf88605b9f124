//! PING/PONG: the liveness probe used both by clients and by routing
//! table maintenance (see `warren-routing::maintenance::Pinger`).

use async_trait::async_trait;

use warren_core::message::{TYPE_PING, TYPE_PONG};
use warren_core::Message;

use crate::service::{Service, ServiceCtx};

pub struct PingService;

#[async_trait]
impl Service for PingService {
    fn name(&self) -> &'static str {
        "ping"
    }

    fn handles(&self) -> &'static [u16] {
        &[TYPE_PING, TYPE_PONG]
    }

    async fn respond(&self, _ctx: &ServiceCtx, request: Message) -> Option<Message> {
        if request.header.msg_type != TYPE_PING {
            return None;
        }
        Some(Message::new(
            TYPE_PONG,
            request.header.tx_id,
            request.header.receiver,
            request.header.sender,
            Vec::new(),
        ))
    }
}
