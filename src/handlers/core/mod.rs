//! Core handler infrastructure: the handler trait, the per-command context
//! and the dispatching registry.

pub mod context;
pub mod registry;
pub mod traits;

pub use context::{Context, Session};
pub use registry::Registry;
pub use traits::{Handler, HandlerPhase};
