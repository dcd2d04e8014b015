//! Logging setup, spans and command timing.

use crate::config::{LogFormat, LoggingConfig};
use std::time::Instant;
use tracing::{Span, debug_span, info_span, trace};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` overrides the default `info`.
pub fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    match config.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

/// Span for one client connection.
pub fn connection_span(uid: &str, addr: &str) -> Span {
    info_span!("connection", uid = %uid, addr = %addr)
}

/// Span for one dispatched command. `target` is recorded when it names a
/// channel.
pub fn command_span(command: &str, uid: &str, target: Option<&str>) -> Span {
    let channel = target.filter(|t| crate::proto::is_channel_name(t));
    debug_span!("irc.command", command = %command, uid = %uid, channel = channel)
}

/// Guard logging how long a command took.
pub struct CommandTimer {
    command: String,
    start: Instant,
}

impl CommandTimer {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            start: Instant::now(),
        }
    }
}

impl Drop for CommandTimer {
    fn drop(&mut self) {
        let elapsed_us = self.start.elapsed().as_micros() as u64;
        trace!(command = %self.command, elapsed_us, "Command finished");
    }
}
