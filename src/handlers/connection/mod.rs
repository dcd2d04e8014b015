//! Connection and registration handlers.
//!
//! Handles NICK, USER, PING, PONG and QUIT, and completes registration once
//! the registration gate opens.

mod nick;
mod ping;
mod user;
mod welcome;

pub use nick::NickHandler;
pub use ping::{PingHandler, PongHandler, QuitHandler};
pub use user::UserHandler;
pub use welcome::complete_registration;
