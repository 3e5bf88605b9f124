//! Per-transaction task helper: register a handler under a `tx_id`,
//! send the request, wait for a response or a deadline, then
//! unregister regardless of which happened first.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::timeout;

use warren_core::message::flags;
use warren_core::Message;

use crate::handler::HandlerList;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaskError {
    #[error("no response received within the deadline")]
    Timeout,

    #[error("a task is already pending for this transaction")]
    AlreadyPending,
}

/// Drives a single request/response exchange keyed by `tx_id` over a
/// shared [`HandlerList`].
pub struct TaskHelper {
    handlers: Arc<HandlerList>,
}

impl TaskHelper {
    pub fn new(handlers: Arc<HandlerList>) -> Self {
        Self { handlers }
    }

    /// Registers `tx_id`, runs `send` to dispatch the request, then
    /// waits up to `deadline` for exactly one response. Unregisters
    /// the handler on every exit path.
    pub async fn call<F, Fut>(
        &self,
        tx_id: u64,
        deadline: Duration,
        send: F,
    ) -> Result<Message, TaskError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = ()>,
    {
        let mut responses = self
            .call_multi_inner(tx_id, deadline, send, |_| true)
            .await;
        let first = responses.drain(..).next();
        first.ok_or(TaskError::Timeout)
    }

    /// Like [`Self::call`] but collects every response delivered
    /// before the deadline elapses, for services that may legitimately
    /// send more than one reply (the `MULTI_RESPONSE` flag).
    pub async fn call_multi<F, Fut>(
        &self,
        tx_id: u64,
        deadline: Duration,
        send: F,
    ) -> Vec<Message>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = ()>,
    {
        self.call_multi_inner(tx_id, deadline, send, |msg| {
            msg.header.flags & flags::MULTI_RESPONSE == 0
        })
        .await
    }

    /// Drives one request/response exchange. `handled_of` decides,
    /// per delivered message, whether the wait is over: `call` is
    /// done after the first message, `call_multi` keeps going as long
    /// as `MULTI_RESPONSE` is set. Exiting on `handled_of` rather than
    /// waiting for the handler to be dropped lets a call return as
    /// soon as its answer arrives instead of always riding out the
    /// full deadline.
    async fn call_multi_inner<F, Fut>(
        &self,
        tx_id: u64,
        deadline: Duration,
        send: F,
        handled_of: impl Fn(&Message) -> bool + Send + Sync + 'static,
    ) -> Vec<Message>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = ()>,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<(Message, bool)>();
        if self
            .handlers
            .add(
                tx_id,
                Arc::new(move |msg| {
                    let handled = handled_of(&msg);
                    let _ = tx.send((msg, handled));
                    handled
                }),
            )
            .is_err()
        {
            return Vec::new();
        }

        send().await;

        let mut out = Vec::new();
        let _ = timeout(deadline, async {
            while let Some((msg, handled)) = rx.recv().await {
                out.push(msg);
                if handled {
                    break;
                }
            }
        })
        .await;

        let _ = self.handlers.remove(tx_id);
        out
    }
}
