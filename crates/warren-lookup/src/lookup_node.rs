//! Concrete FIND_NODE-driven lookup: the use case the generic engine
//! was built for.

use std::sync::Arc;
use std::time::Duration;

use warren_core::message::TYPE_FIND_NODE;
use warren_core::{Address, Message};
use warren_node::Node;
use warren_services::builtin::find_node::decode_entries;

use crate::engine::{lookup, LookupConfig, LookupResult, Query, QueryOutcome};

/// Drives a single FIND_NODE request/response exchange against `peer`
/// through the owning node's task helper.
pub struct LookupNode {
    node: Arc<Node>,
    target: Address,
    per_query_timeout: Duration,
}

impl LookupNode {
    pub fn new(node: Arc<Node>, target: Address, per_query_timeout: Duration) -> Self {
        Self {
            node,
            target,
            per_query_timeout,
        }
    }
}

#[async_trait::async_trait]
impl Query for LookupNode {
    type Output = ();

    async fn ask(&self, peer: Address) -> QueryOutcome<()> {
        let tx_id = self.node.next_id();
        let mut payload = Vec::with_capacity(32);
        payload.extend_from_slice(self.target.as_bytes());
        let request = Message::new(TYPE_FIND_NODE, tx_id, self.node.address, peer, payload);

        let node = &self.node;
        let response = node
            .task_helper()
            .call(tx_id, self.per_query_timeout, || async {
                let _ = node.send(request).await;
            })
            .await;

        match response {
            Ok(msg) => {
                let entries = decode_entries(&msg.payload);
                for (addr, endpoint) in &entries {
                    if !endpoint.is_empty() {
                        self.node.learn_peer(*addr, endpoint.clone());
                    }
                }
                QueryOutcome::Candidates(entries.into_iter().map(|(addr, _)| addr).collect())
            }
            Err(_) => QueryOutcome::Failed,
        }
    }
}

/// Finds the `k` nodes in the overlay closest to `target`, starting
/// from `seeds`. The FIND_NODE protocol never reports a direct "hit"
/// the way FIND_VALUE can, so this always returns the closest set
/// discovered (or an empty one if the deadline is hit immediately).
pub async fn find_closest_nodes(
    node: Arc<Node>,
    target: Address,
    seeds: Vec<Address>,
    cfg: LookupConfig,
) -> Vec<Address> {
    let per_query_timeout = cfg.per_query_timeout;
    let query = Arc::new(LookupNode::new(node, target, per_query_timeout));
    match lookup(target, seeds, query, cfg).await {
        LookupResult::Exhausted(addrs) => addrs,
        LookupResult::Found(()) => Vec::new(),
        LookupResult::DeadlineExceeded => Vec::new(),
    }
}
