use std::sync::Arc;
use std::time::Duration;

use warren_core::message::TYPE_PING;
use warren_core::{packet, Keypair, Message};
use warren_node::transport::loopback::LoopbackNetwork;
use warren_node::transport::Transport;
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
async fn spoofed_sender_is_rejected_before_reaching_a_service() {
    let net = LoopbackNetwork::new();
    let victim = build_node(&net);
    tokio::spawn(victim.clone().run(victim.listen()));

    let honest = Keypair::generate();
    let mallory = Keypair::generate();
    let attacker_transport = net.join(honest.public);

    // Mallory builds a legitimate-looking plaintext message claiming
    // to be `honest`, but encrypts it under her own key exchange
    // token. The receiver's KXT recomputation — keyed off the
    // plaintext's claimed sender — must catch the mismatch.
    let forged = Message::new(TYPE_PING, 1, honest.public, victim.address, vec![]);
    let plaintext = forged.to_bytes();
    let packet = packet::encrypt(&mallory, &victim.address, &plaintext).unwrap();

    attacker_transport
        .send(victim.address, packet.to_bytes())
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    // The victim never had a reason to learn `honest`'s address from
    // a packet that failed authentication.
    assert!(!victim.routing.contains(&honest.public));
}

#[tokio::test]
async fn tampered_ciphertext_never_produces_a_response() {
    let net = LoopbackNetwork::new();
    let victim = build_node(&net);
    tokio::spawn(victim.clone().run(victim.listen()));

    let sender = Keypair::generate();
    let sender_transport = net.join(sender.public);

    let ping = Message::new(TYPE_PING, 1, sender.public, victim.address, vec![]);
    let plaintext = ping.to_bytes();
    let mut encrypted = packet::encrypt(&sender, &victim.address, &plaintext).unwrap();
    let last = encrypted.ciphertext.len() - 1;
    encrypted.ciphertext[last] ^= 0xff;

    sender_transport
        .send(victim.address, encrypted.to_bytes())
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    // A tampered packet must be dropped before it is ever attributed
    // to a sender, so the victim should not have learned it.
    assert!(!victim.routing.contains(&sender.public));
}
