//! The `Service` abstraction: a unit of protocol logic that owns a set
//! of message types, can build outgoing messages of those types, can
//! answer requests, and can observe responses/notifications that
//! don't go through the per-transaction task helper.

use async_trait::async_trait;

use warren_core::{Address, Message};

/// Shared context handed to every service call. Kept deliberately
/// small and data-only so services stay independently testable.
#[derive(Clone)]
pub struct ServiceCtx {
    pub local: Address,
}

#[async_trait]
pub trait Service: Send + Sync {
    /// Stable name, used in logs.
    fn name(&self) -> &'static str;

    /// Message types this service owns. Dispatch routes any message
    /// whose type appears here to this service.
    fn handles(&self) -> &'static [u16];

    /// Builds an outgoing message of one of this service's types.
    fn new_message(
        &self,
        msg_type: u16,
        tx_id: u64,
        sender: Address,
        receiver: Address,
        payload: Vec<u8>,
    ) -> Message {
        Message::new(msg_type, tx_id, sender, receiver, payload)
    }

    /// Answers an incoming request, returning the response message to
    /// send back (if any — some message types are fire-and-forget).
    async fn respond(&self, ctx: &ServiceCtx, request: Message) -> Option<Message>;

    /// Observes an incoming response/notification that was not
    /// claimed by a waiting per-transaction task. Most services leave
    /// this a no-op; routing-adjacent services use it to learn peers
    /// from traffic that passes through regardless of why it arrived.
    async fn listen(&self, _ctx: &ServiceCtx, _msg: Message) {}
}
