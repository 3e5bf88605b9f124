//! The node runtime: one dispatcher loop pumping incoming packets,
//! spawning a task per message, ticking a one-minute epoch, and
//! exposing `send`/`next_id` to every service and the lookup engine.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use warren_core::message::{TYPE_PING, TYPE_PONG, TYPE_RELAY};
use warren_core::packet::{self, Packet};
use warren_core::time::{Clock, SystemClock};
use warren_core::{Address, Keypair, Message};
use warren_routing::maintenance::{Pinger, ReplacementTask, DEFAULT_PROBE_TIMEOUT_SECS};
use warren_routing::{InsertOutcome, RoutingTable};
use warren_services::builtin::relay::{RelayForwarder, RelayService};
use warren_services::{HandlerList, Service, ServiceCtx, TaskHelper};

use crate::connector::Connector;
use crate::error::NodeError;
use crate::registry::ServiceRegistry;
use crate::transport::Transport;

const EPOCH_INTERVAL: Duration = Duration::from_secs(60);
const HEADER_SENDER_OFFSET: usize = 16;
const HEADER_RECEIVER_OFFSET: usize = 48;

pub struct Node {
    keypair: Keypair,
    pub address: Address,
    pub routing: Arc<RoutingTable>,
    services: ServiceRegistry,
    tx_handlers: Arc<HandlerList>,
    task_helper: TaskHelper,
    tx_counter: AtomicU64,
    connector: Connector,
    clock: Arc<dyn Clock>,
    cancel: CancellationToken,
    replacement: ReplacementTask,
}

/// Pings a routing-table candidate by sending it a real PING over the
/// owning node's own transport, closing the loop the routing crate was
/// deliberately kept unaware of.
struct SelfPinger(Weak<Node>);

#[async_trait]
impl Pinger for SelfPinger {
    async fn ping(&self, addr: Address) -> bool {
        let Some(node) = self.0.upgrade() else {
            return false;
        };
        let tx_id = node.next_id();
        let ping = Message::new(TYPE_PING, tx_id, node.address, addr, vec![]);
        let result = node
            .task_helper()
            .call(tx_id, Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS), || {
                let node = node.clone();
                async move {
                    let _ = node.send(ping).await;
                }
            })
            .await;
        matches!(result, Ok(m) if m.header.msg_type == TYPE_PONG)
    }
}

/// Forwards or re-injects RELAY layers on behalf of the owning node,
/// closing the same loop `SelfPinger` closes for liveness probes.
struct SelfRelayForwarder(Weak<Node>);

#[async_trait]
impl RelayForwarder for SelfRelayForwarder {
    async fn forward(&self, next_hop: Address, endpoint: String, inner_packet: Vec<u8>) {
        let Some(node) = self.0.upgrade() else {
            return;
        };
        if !endpoint.is_empty() {
            node.learn_peer(next_hop, endpoint);
        }
        if let Err(e) = node.connector.transport().send(next_hop, inner_packet).await {
            tracing::warn!(error = %e, "relay forward failed");
        }
    }

    async fn reinject(&self, inner_packet: Vec<u8>) {
        let Some(node) = self.0.upgrade() else {
            return;
        };
        node.handle_incoming(inner_packet).await;
    }
}

impl Node {
    pub fn new(
        keypair: Keypair,
        routing: Arc<RoutingTable>,
        mut services: ServiceRegistry,
        transport: Arc<dyn Transport>,
    ) -> Arc<Self> {
        let address = keypair.public;
        let tx_handlers = Arc::new(HandlerList::new());
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Arc::new_cyclic(|weak| {
            let pinger: Arc<dyn Pinger> = Arc::new(SelfPinger(weak.clone()));
            let replacement = ReplacementTask::spawn(
                routing.clone(),
                clock.clone(),
                pinger,
                Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS),
            );
            services.register(Arc::new(RelayService::new(Box::new(SelfRelayForwarder(
                weak.clone(),
            )))));
            Self {
                keypair,
                address,
                routing,
                services,
                tx_handlers: tx_handlers.clone(),
                task_helper: TaskHelper::new(tx_handlers),
                tx_counter: AtomicU64::new(1),
                connector: Connector::new(transport),
                clock,
                cancel: CancellationToken::new(),
                replacement,
            }
        })
    }

    pub fn next_id(&self) -> u64 {
        self.tx_counter.fetch_add(1, Ordering::Relaxed)
    }

    pub fn task_helper(&self) -> &TaskHelper {
        &self.task_helper
    }

    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Registers and returns the channel incoming raw packets arrive
    /// on. Must be called exactly once per node before [`Self::run`].
    pub fn listen(&self) -> mpsc::Receiver<(Address, Vec<u8>)> {
        self.connector.transport().listen()
    }

    /// Records a discovered endpoint for `addr`, e.g. one carried in a
    /// FIND_NODE_RESP entry, so future sends and RELAY forwarding can
    /// resolve it without another round trip.
    pub fn learn_peer(&self, addr: Address, netaddr: String) {
        self.connector.learn(addr, netaddr);
    }

    /// Encrypts and sends `msg` to its addressed receiver.
    pub async fn send(&self, msg: Message) -> Result<(), NodeError> {
        let plaintext = msg.to_bytes();
        let packet = packet::encrypt(&self.keypair, &msg.header.receiver, &plaintext)?;
        self.connector
            .transport()
            .send(msg.header.receiver, packet.to_bytes())
            .await?;
        Ok(())
    }

    /// Runs the dispatcher loop until shut down. `incoming` is the
    /// channel the wired-up [`Transport::listen`] produced.
    pub async fn run(self: Arc<Self>, mut incoming: mpsc::Receiver<(Address, Vec<u8>)>) {
        let mut epoch = tokio::time::interval(EPOCH_INTERVAL);
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!("node shutting down");
                    return;
                }
                _ = epoch.tick() => {
                    self.connector.transport().epoch().await;
                }
                maybe = incoming.recv() => {
                    let Some((_from, bytes)) = maybe else {
                        tracing::info!("transport channel closed");
                        return;
                    };
                    let node = self.clone();
                    tokio::spawn(async move {
                        node.handle_incoming(bytes).await;
                    });
                }
            }
        }
    }

    async fn handle_incoming(&self, bytes: Vec<u8>) {
        let packet = match Packet::from_bytes(&bytes) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "dropping malformed packet");
                return;
            }
        };

        let plaintext = match packet::decrypt(&self.keypair, &packet, sender_from_plaintext) {
            Ok(pt) => pt,
            Err(e) => {
                tracing::warn!(error = %e, "dropping packet that failed authentication");
                return;
            }
        };

        let msg = match Message::from_bytes(&plaintext) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(error = %e, "dropping undecodable message");
                return;
            }
        };

        let outcome = self.routing.observe(msg.header.sender, self.clock.unix_secs());
        if matches!(outcome, Some(InsertOutcome::Full { .. })) {
            self.replacement.queue(msg.header.sender);
        }

        if msg.header.is_request() {
            self.handle_request(msg).await;
        } else {
            self.handle_response(msg).await;
        }
    }

    async fn handle_request(&self, msg: Message) {
        let Some(service) = self.services.get(msg.header.msg_type) else {
            tracing::warn!(msg_type = msg.header.msg_type, "no service registered for request type");
            return;
        };
        let ctx = ServiceCtx { local: self.address };
        if let Some(response) = service.respond(&ctx, msg).await {
            if let Err(e) = self.send(response).await {
                tracing::warn!(error = %e, "failed to send service response");
            }
        }
    }

    async fn handle_response(&self, msg: Message) {
        let tx_id = msg.header.tx_id;
        let msg_type = msg.header.msg_type;
        if self.tx_handlers.dispatch(tx_id, msg.clone()).is_some() {
            return;
        }
        if let Some(service) = self.services.get(msg_type) {
            let ctx = ServiceCtx { local: self.address };
            service.listen(&ctx, msg).await;
        }
    }
}

fn sender_from_plaintext(pt: &[u8]) -> Option<Address> {
    if pt.len() < HEADER_RECEIVER_OFFSET {
        return None;
    }
    let bytes: [u8; 32] = pt[HEADER_SENDER_OFFSET..HEADER_RECEIVER_OFFSET]
        .try_into()
        .ok()?;
    Some(Address::from_bytes(bytes))
}
