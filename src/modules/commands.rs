//! The core command set.

use super::{Module, ModuleHost};
use crate::error::ModuleError;
use crate::handlers::{
    AwayHandler, CapHandler, JoinHandler, KickHandler, ModeHandler, NamesHandler, NickHandler,
    NoticeHandler, PartHandler, PingHandler, PongHandler, PrivmsgHandler, QuitHandler,
    TagmsgHandler, TopicHandler, UserHandler, WhoHandler, WhoisHandler,
};

pub struct CoreCommands;

impl Module for CoreCommands {
    fn name(&self) -> &'static str {
        "core-commands"
    }

    fn load(&self, host: &mut ModuleHost<'_>) -> Result<(), ModuleError> {
        // connection
        host.add_command("CAP", CapHandler)?;
        host.add_command("NICK", NickHandler)?;
        host.add_command("USER", UserHandler)?;
        host.add_command("PING", PingHandler)?;
        host.add_command("PONG", PongHandler)?;
        host.add_command("QUIT", QuitHandler)?;

        // channels
        host.add_command("JOIN", JoinHandler)?;
        host.add_command("PART", PartHandler)?;
        host.add_command("KICK", KickHandler)?;
        host.add_command("TOPIC", TopicHandler)?;
        host.add_command("NAMES", NamesHandler)?;
        host.add_command("MODE", ModeHandler)?;

        // messaging
        host.add_command("PRIVMSG", PrivmsgHandler)?;
        host.add_command("NOTICE", NoticeHandler)?;
        host.add_command("TAGMSG", TagmsgHandler)?;

        // users
        host.add_command("WHO", WhoHandler)?;
        host.add_command("WHOIS", WhoisHandler)?;
        host.add_command("AWAY", AwayHandler)?;
        Ok(())
    }
}
