//! Concurrent handler registry keyed by an integer — either a message
//! type (for per-service dispatch) or a transaction id (for
//! per-request response routing).

use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;

use warren_core::Message;

/// Invoked with a delivered message; returns whether this delivery is
/// the final one the registrant is waiting for, so a waiting call can
/// stop as soon as it arrives instead of always riding out its full
/// deadline.
pub type HandlerFn = Arc<dyn Fn(Message) -> bool + Send + Sync>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HandlerError {
    #[error("a handler is already registered for key {0}")]
    HandlerInUse(u64),

    #[error("no handler is registered for key {0}")]
    HandlerUnused(u64),
}

/// A `DashMap`-backed registry of handlers. Safe to dispatch into
/// concurrently with registrations and removals from other tasks.
#[derive(Default)]
pub struct HandlerList {
    handlers: DashMap<u64, HandlerFn>,
}

impl HandlerList {
    pub fn new() -> Self {
        Self {
            handlers: DashMap::new(),
        }
    }

    pub fn add(&self, key: u64, f: HandlerFn) -> Result<(), HandlerError> {
        if self.handlers.contains_key(&key) {
            return Err(HandlerError::HandlerInUse(key));
        }
        self.handlers.insert(key, f);
        Ok(())
    }

    pub fn remove(&self, key: u64) -> Result<(), HandlerError> {
        self.handlers
            .remove(&key)
            .map(|_| ())
            .ok_or(HandlerError::HandlerUnused(key))
    }

    /// Dispatches `msg` to the handler registered under `key`. Returns
    /// `None` if no handler was registered, otherwise `Some(handled)`
    /// with whatever the handler itself reported.
    pub fn dispatch(&self, key: u64, msg: Message) -> Option<bool> {
        self.handlers.get(&key).map(|handler| handler(msg))
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
