use std::sync::Arc;
use std::time::Duration;

use warren_core::message::{TYPE_PING, TYPE_PONG};
use warren_core::{Keypair, Message};
use warren_node::transport::loopback::LoopbackNetwork;
use warren_node::{Node, ServiceRegistry};
use warren_routing::RoutingTable;
use warren_services::builtin::PingService;

fn build_node(net: &LoopbackNetwork) -> Arc<Node> {
    let keypair = Keypair::generate();
    let transport = Arc::new(net.join(keypair.public));
    let routing = Arc::new(RoutingTable::new(keypair.public));
    let mut services = ServiceRegistry::new();
    services.register(Arc::new(PingService));
    Node::new(keypair, routing, services, transport)
}

#[tokio::test]
async fn ping_round_trip_end_to_end() {
    let net = LoopbackNetwork::new();
    let a = build_node(&net);
    let b = build_node(&net);

    tokio::spawn(a.clone().run(a.listen()));
    tokio::spawn(b.clone().run(b.listen()));

    let tx_id = a.next_id();
    let ping = Message::new(TYPE_PING, tx_id, a.address, b.address, vec![]);
    let response = a
        .task_helper()
        .call(tx_id, Duration::from_secs(2), || async {
            a.send(ping).await.unwrap();
        })
        .await
        .expect("should receive a PONG before the deadline");

    assert_eq!(response.header.msg_type, TYPE_PONG);
    assert_eq!(response.header.sender, b.address);
    assert_eq!(response.header.receiver, a.address);

    // A also learns about B in its routing table from the exchange.
    assert!(a.routing.contains(&b.address));
}
