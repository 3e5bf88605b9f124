pub mod address;
pub mod codec;
pub mod config;
pub mod error;
pub mod message;
pub mod packet;
pub mod time;

pub use address::Address;
pub use error::{CodecError, CryptoError};
pub use message::{Header, Message};
pub use packet::{Keypair, Packet};
