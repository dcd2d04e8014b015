//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

/// Returns `true` (for serde defaults).
pub fn default_true() -> bool {
    true
}

// =============================================================================
// Server Defaults
// =============================================================================

pub fn default_sid() -> String {
    "001".to_string()
}

pub fn default_version() -> String {
    format!("modircd-{}", env!("CARGO_PKG_VERSION"))
}

pub fn default_description() -> String {
    "modircd server".to_string()
}

// =============================================================================
// Listen Defaults
// =============================================================================

pub fn default_listen_address() -> std::net::SocketAddr {
    std::net::SocketAddr::from(([0, 0, 0, 0], 6667))
}

// =============================================================================
// Limits Defaults
// =============================================================================

pub fn default_nick_len() -> usize {
    30
}

pub fn default_channel_len() -> usize {
    50
}

pub fn default_max_channels() -> usize {
    20
}

pub fn default_sendq() -> usize {
    512
}
