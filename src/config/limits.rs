//! Protocol limits configuration.

use super::defaults::{default_channel_len, default_max_channels, default_nick_len, default_sendq};
use serde::Deserialize;

/// Protocol limits advertised in ISUPPORT and enforced by handlers.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Longest nickname; longer ones are truncated (NICKLEN).
    #[serde(default = "default_nick_len")]
    pub nick_len: usize,
    /// Longest channel name (CHANNELLEN).
    #[serde(default = "default_channel_len")]
    pub channel_len: usize,
    /// Channels one user may be in (CHANLIMIT).
    #[serde(default = "default_max_channels")]
    pub max_channels: usize,
    /// Outbound queue capacity per client, in messages.
    #[serde(default = "default_sendq")]
    pub sendq: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            nick_len: default_nick_len(),
            channel_len: default_channel_len(),
            max_channels: default_max_channels(),
            sendq: default_sendq(),
        }
    }
}
