//! modircd - a modular IRC daemon core.
//!
//! Server state lives in the [`state::Matrix`]. Channel and user modes are
//! defined through the mode registry and checked against the access
//! hierarchy; everything beyond the bare core is contributed by
//! [`modules`] through typed [`hooks`] and registered command handlers.

pub mod caps;
pub mod config;
pub mod error;
pub mod handlers;
pub mod hooks;
pub mod modules;
pub mod network;
pub mod proto;
pub mod state;
pub mod telemetry;
