pub mod find_node;
pub mod find_value;
pub mod ping;
pub mod relay;
pub mod store;

pub use find_node::FindNodeService;
pub use find_value::FindValueService;
pub use ping::PingService;
pub use relay::RelayService;
pub use store::{StoreService, ValueStore};
