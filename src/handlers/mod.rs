//! IRC command handlers.
//!
//! Every handler implements [`Handler`] and is registered under its verb in
//! the [`Registry`] by the `core-commands` module. Handlers answer through
//! `ctx.out`; anything addressed to other users goes through the `Matrix`.

mod cap;
mod channel;
mod connection;
mod core;
mod helpers;
mod messaging;
mod mode;
mod user_query;
mod user_status;

pub use self::core::{Context, Handler, HandlerPhase, Registry, Session};
pub use cap::CapHandler;
pub use channel::{JoinHandler, KickHandler, NamesHandler, PartHandler, TopicHandler};
pub use connection::{
    NickHandler, PingHandler, PongHandler, QuitHandler, UserHandler, complete_registration,
};
pub use messaging::{NoticeHandler, PrivmsgHandler, TagmsgHandler};
pub use mode::ModeHandler;
pub use user_query::{WhoHandler, WhoisHandler};
pub use user_status::AwayHandler;

pub(crate) use helpers::{join_chunks, report, split_targets};
