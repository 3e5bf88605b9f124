pub mod engine;
pub mod lookup_node;

pub use engine::{lookup, LookupConfig, LookupResult, Query, QueryOutcome};
pub use lookup_node::{find_closest_nodes, LookupNode};
