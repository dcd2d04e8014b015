//! Network module.
//!
//! Contains the Gateway (TCP listener), the per-client Connection loop, the
//! labeled-response batcher and reverse DNS.

mod batch;
mod connection;
mod dns;
mod gateway;

pub use batch::ResponseBatcher;
pub use connection::{Connection, MAX_LINE_LEN};
pub use dns::ReverseResolver;
pub use gateway::Gateway;
