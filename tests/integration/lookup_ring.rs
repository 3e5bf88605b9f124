use std::sync::Arc;
use std::time::Duration;

use warren_core::Keypair;
use warren_lookup::{find_closest_nodes, LookupConfig};
use warren_node::transport::loopback::LoopbackNetwork;
use warren_node::{Node, ServiceRegistry, TransportResolver};
use warren_routing::RoutingTable;
use warren_services::builtin::FindNodeService;

const RING_SIZE: usize = 32;

fn build_ring(net: &LoopbackNetwork) -> Vec<Arc<Node>> {
    let keypairs: Vec<Keypair> = (0..RING_SIZE as u8)
        .map(|i| Keypair::from_private([i; 32]))
        .collect();
    let addresses: Vec<_> = keypairs.iter().map(|k| k.public).collect();

    let mut nodes = Vec::with_capacity(RING_SIZE);
    for (i, keypair) in keypairs.into_iter().enumerate() {
        let transport = Arc::new(net.join(keypair.public));
        let routing = Arc::new(RoutingTable::new(keypair.public));

        // Each node in the ring only knows its two immediate neighbors,
        // the way a freshly-joined Kademlia peer would: FIND_NODE
        // requests have to hop several peers to reach a far target.
        let next = addresses[(i + 1) % RING_SIZE];
        let prev = addresses[(i + RING_SIZE - 1) % RING_SIZE];
        routing.observe(next, 0);
        routing.observe(prev, 0);

        let resolver = Arc::new(TransportResolver::new(transport.clone()));
        let mut services = ServiceRegistry::new();
        services.register(Arc::new(FindNodeService::new(routing.clone(), resolver)));

        let node = Node::new(keypair, routing, services, transport);
        tokio::spawn(node.clone().run(node.listen()));
        nodes.push(node);
    }
    nodes
}

#[tokio::test]
async fn iterative_lookup_hops_across_the_ring_to_find_the_target() {
    let net = LoopbackNetwork::new();
    let nodes = build_ring(&net);

    // Node 0 only knows node 1 to start; the target sits on the far
    // side of the ring and is only reachable by following successive
    // FIND_NODE hops through intermediate peers.
    let origin = nodes[0].clone();
    let target = nodes[RING_SIZE / 2].address;
    let seeds = vec![nodes[1].address];

    let cfg = LookupConfig {
        lookup_timeout: Duration::from_secs(5),
        ..LookupConfig::default()
    };

    let closest = find_closest_nodes(origin, target, seeds, cfg).await;

    assert!(!closest.is_empty());
    assert_eq!(closest[0], target);
}

#[tokio::test]
async fn lookup_from_an_immediate_neighbor_is_a_single_hop() {
    let net = LoopbackNetwork::new();
    let nodes = build_ring(&net);

    let origin = nodes[0].clone();
    let target = nodes[1].address;
    let seeds = vec![nodes[1].address];

    let cfg = LookupConfig {
        lookup_timeout: Duration::from_secs(2),
        ..LookupConfig::default()
    };

    let closest = find_closest_nodes(origin, target, seeds, cfg).await;
    assert_eq!(closest.first(), Some(&target));
}
