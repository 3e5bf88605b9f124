use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use warren_core::message::{TYPE_PING, TYPE_PONG};
use warren_core::time::MockClock;
use warren_core::{Address, Keypair, Message};
use warren_node::transport::loopback::LoopbackNetwork;
use warren_node::{Node, ServiceRegistry};
use warren_routing::maintenance::{Pinger, ReplacementTask};
use warren_routing::RoutingTable;
use warren_services::builtin::PingService;

/// An address in the same bucket as `existing` (relative to `owner`),
/// distinct from it. A real replacement candidate is always discovered
/// while trying to insert into a specific bucket, so it necessarily
/// shares that bucket with the entry it might replace.
fn sibling_in_bucket(owner: Address, existing: Address) -> Address {
    let dist = owner.distance(&existing);
    let mut sibling_dist = dist;
    sibling_dist[31] ^= 0x01;
    let mut bytes = [0u8; 32];
    for i in 0..32 {
        bytes[i] = owner.as_bytes()[i] ^ sibling_dist[i];
    }
    Address::from_bytes(bytes)
}

fn build_node(net: &LoopbackNetwork) -> Arc<Node> {
    let keypair = Keypair::generate();
    let transport = Arc::new(net.join(keypair.public));
    let routing = Arc::new(RoutingTable::new(keypair.public));
    let mut services = ServiceRegistry::new();
    services.register(Arc::new(PingService));
    Node::new(keypair, routing, services, transport)
}

/// Routes the routing table's probe request through a real node's
/// PING service over the loopback transport, instead of a canned
/// true/false stub — this is the wiring `warren-routing` was designed
/// to stay decoupled from.
struct NodePinger(Arc<Node>);

#[async_trait]
impl Pinger for NodePinger {
    async fn ping(&self, addr: Address) -> bool {
        let tx_id = self.0.next_id();
        let ping = Message::new(TYPE_PING, tx_id, self.0.address, addr, vec![]);
        let node = self.0.clone();
        let send_node = node.clone();
        let result = node
            .task_helper()
            .call(tx_id, Duration::from_millis(300), || async move {
                let _ = send_node.send(ping).await;
            })
            .await;
        matches!(result, Ok(m) if m.header.msg_type == TYPE_PONG)
    }
}

#[tokio::test]
async fn full_bucket_with_alive_lru_rejects_newcomer() {
    let net = LoopbackNetwork::new();
    let owner = build_node(&net);
    let alive_peer = build_node(&net);
    tokio::spawn(alive_peer.clone().run(alive_peer.listen()));

    let table = Arc::new(RoutingTable::new(owner.address));
    // ReplacementTask only cares about the LRU entry of the bucket a
    // candidate lands in, not whether the bucket has reached K entries
    // (fullness is the caller's concern, at the `observe` call site).
    table.observe(alive_peer.address, 0);

    let clock = Arc::new(MockClock::new(1000));
    let pinger = Arc::new(NodePinger(owner.clone()));
    let task = ReplacementTask::spawn(table.clone(), clock, pinger, Duration::from_millis(250));

    let newcomer = sibling_in_bucket(owner.address, alive_peer.address);
    task.queue(newcomer);
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(table.contains(&alive_peer.address));
    assert!(!table.contains(&newcomer));
}

#[tokio::test]
async fn expired_lru_with_dead_peer_is_replaced() {
    let net = LoopbackNetwork::new();
    let owner = build_node(&net);
    // A keypair with no node behind it: pinging it always times out.
    let dead_addr = Keypair::generate().public;

    let table = Arc::new(RoutingTable::new(owner.address));
    table.observe(dead_addr, 0);

    let clock = Arc::new(MockClock::new(10_000));
    let pinger = Arc::new(NodePinger(owner.clone()));
    let task = ReplacementTask::spawn(table.clone(), clock, pinger, Duration::from_millis(100));

    let newcomer = sibling_in_bucket(owner.address, dead_addr);
    task.queue(newcomer);
    tokio::time::sleep(Duration::from_millis(250)).await;

    assert!(!table.contains(&dead_addr));
    assert!(table.contains(&newcomer));
}
