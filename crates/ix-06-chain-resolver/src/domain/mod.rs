pub mod channel;
pub mod errors;
pub mod network;

pub use channel::*;
pub use errors::*;
pub use network::*;
