//! Demo CLI: brings up a single node over the in-process loopback
//! transport and lets you PING another node started the same way.
//!
//! This is scaffolding for interactive smoke-testing, not a
//! production entry point — there is no real transport wired in here.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use warren_core::message::{TYPE_PING, TYPE_PONG};
use warren_core::{Address, Keypair, Message};
use warren_node::transport::loopback::LoopbackNetwork;
use warren_node::{Node, ServiceRegistry};
use warren_routing::RoutingTable;
use warren_services::builtin::PingService;

fn print_usage() {
    eprintln!("usage: warren ping-demo");
    eprintln!();
    eprintln!("Starts two loopback nodes and exchanges a single PING/PONG.");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("ping-demo") => ping_demo().await,
        _ => {
            print_usage();
            Ok(())
        }
    }
}

fn build_node(net: &LoopbackNetwork) -> Arc<Node> {
    let keypair = Keypair::generate();
    let transport = Arc::new(net.join(keypair.public));
    let routing = Arc::new(RoutingTable::new(keypair.public));
    let mut services = ServiceRegistry::new();
    services.register(Arc::new(PingService));
    Node::new(keypair, routing, services, transport)
}

async fn ping_demo() -> anyhow::Result<()> {
    let net = LoopbackNetwork::new();
    let a = build_node(&net);
    let b = build_node(&net);

    tracing::info!(a = %a.address, b = %b.address, "started two loopback nodes");

    let a_incoming = a.listen();
    let b_incoming = b.listen();
    tokio::spawn(a.clone().run(a_incoming));
    tokio::spawn(b.clone().run(b_incoming));

    let tx_id = a.next_id();
    let ping = Message::new(TYPE_PING, tx_id, a.address, b.address, Vec::new());
    let response = a
        .task_helper()
        .call(tx_id, Duration::from_secs(2), || async {
            a.send(ping).await.context("sending ping").unwrap();
        })
        .await
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    if response.header.msg_type == TYPE_PONG {
        println!("received PONG from {}", address_hex(&response.header.sender));
    } else {
        println!("unexpected response type {}", response.header.msg_type);
    }

    Ok(())
}

fn address_hex(addr: &Address) -> String {
    hex::encode(addr.as_bytes())
}
