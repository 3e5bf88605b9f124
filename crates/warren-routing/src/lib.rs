pub mod bucket;
pub mod maintenance;
pub mod table;

pub use bucket::{Bucket, Drop, InsertOutcome};
pub use maintenance::{Pinger, ReplacementTask};
pub use table::RoutingTable;
