//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Core config struct definitions (Config, ServerConfig, MotdConfig)
//! - [`listen`]: Network listener configuration (ListenConfig)
//! - [`limits`]: Protocol limits (LimitsConfig)
//! - [`oper`]: Operator blocks (OperBlock)
//! - [`validation`]: Startup checks

mod defaults;
mod limits;
mod listen;
mod oper;
mod types;
pub mod validation;

pub use limits::LimitsConfig;
pub use listen::ListenConfig;
pub use oper::OperBlock;
pub use types::{Config, ConfigError, LogFormat, LoggingConfig, MotdConfig, ServerConfig};
pub use validation::{ValidationError, validate};
