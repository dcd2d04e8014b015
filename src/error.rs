//! Unified error handling for modircd.
//!
//! Client protocol and permission failures map to numeric replies through
//! `to_irc_reply`; load-time registration conflicts and configuration bugs
//! are their own enums so callers can't confuse them with bad client input.

use crate::proto::{Message, Prefix, Response};
use thiserror::Error;

// ============================================================================
// Handler Errors (command processing)
// ============================================================================

/// Errors that can occur during command handling.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("not enough parameters")]
    NeedMoreParams,

    #[error("no text to send")]
    NoTextToSend,

    #[error("no nickname given")]
    NoNicknameGiven,

    #[error("nickname in use: {0}")]
    NicknameInUse(String),

    #[error("erroneous nickname: {0}")]
    ErroneousNickname(String),

    #[error("not registered")]
    NotRegistered,

    #[error("already registered")]
    AlreadyRegistered,

    #[error("no such channel: {0}")]
    NoSuchChannel(String),

    #[error("no such nick: {0}")]
    NoSuchNick(String),

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("{error} ({channel})")]
    Channel { channel: String, error: ChannelError },

    #[error(transparent)]
    Mode(#[from] ModeError),

    #[error("client quit: {0:?}")]
    Quit(Option<String>),

    #[error("internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    /// Static error code string for log labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NeedMoreParams => "need_more_params",
            Self::NoTextToSend => "no_text_to_send",
            Self::NoNicknameGiven => "no_nickname_given",
            Self::NicknameInUse(_) => "nickname_in_use",
            Self::ErroneousNickname(_) => "erroneous_nickname",
            Self::NotRegistered => "not_registered",
            Self::AlreadyRegistered => "already_registered",
            Self::NoSuchChannel(_) => "no_such_channel",
            Self::NoSuchNick(_) => "no_such_nick",
            Self::UnknownCommand(_) => "unknown_command",
            Self::Channel { .. } => "channel_error",
            Self::Mode(_) => "mode_error",
            Self::Quit(_) => "quit",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Convert to an IRC error reply message.
    ///
    /// Returns `None` for errors that don't warrant a client-visible reply.
    pub fn to_irc_reply(&self, server_name: &str, nick: &str, cmd_name: &str) -> Option<Message> {
        let (response, params): (Response, Vec<&str>) = match self {
            Self::NeedMoreParams => (
                Response::ERR_NEEDMOREPARAMS,
                vec![cmd_name, "Not enough parameters"],
            ),
            Self::NoTextToSend => (Response::ERR_NOTEXTTOSEND, vec!["No text to send"]),
            Self::NoNicknameGiven => (Response::ERR_NONICKNAMEGIVEN, vec!["No nickname given"]),
            Self::NicknameInUse(bad) => (
                Response::ERR_NICKNAMEINUSE,
                vec![bad.as_str(), "Nickname is already in use"],
            ),
            Self::ErroneousNickname(bad) => (
                Response::ERR_ERRONEUSNICKNAME,
                vec![bad.as_str(), "Erroneous nickname"],
            ),
            Self::NotRegistered => (Response::ERR_NOTREGISTERED, vec!["You have not registered"]),
            Self::AlreadyRegistered => (
                Response::ERR_ALREADYREGISTRED,
                vec!["You may not reregister"],
            ),
            Self::NoSuchChannel(chan) => (Response::ERR_NOSUCHCHANNEL, vec![chan.as_str(), "No such channel"]),
            Self::NoSuchNick(target) => (
                Response::ERR_NOSUCHNICK,
                vec![target.as_str(), "No such nick/channel"],
            ),
            Self::UnknownCommand(cmd) => (Response::ERR_UNKNOWNCOMMAND, vec![cmd.as_str(), "Unknown command"]),
            Self::Channel { channel, error } => {
                return Some(error.to_irc_reply(server_name, nick, channel));
            }

            // These errors don't get client-visible replies
            Self::Mode(_) | Self::Quit(_) | Self::Internal(_) => return None,
        };

        Some(numeric(server_name, nick, response, &params))
    }
}

/// Result type for command handlers.
pub type HandlerResult = Result<(), HandlerError>;

fn numeric(server_name: &str, nick: &str, response: Response, params: &[&str]) -> Message {
    let mut args = Vec::with_capacity(params.len() + 1);
    args.push(nick.to_string());
    args.extend(params.iter().map(|p| p.to_string()));
    Message::new(response.to_string(), args).with_prefix(Prefix::ServerName(server_name.to_string()))
}

// ============================================================================
// Channel Errors
// ============================================================================

/// Channel operation errors, each with a fixed numeric.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("not on channel")]
    NotOnChannel,

    #[error("you're not channel operator")]
    ChanOpPrivsNeeded,

    #[error("user {0} is not on that channel")]
    UserNotInChannel(String),

    #[error("user {0} is already on that channel")]
    UserOnChannel(String),

    #[error("cannot join channel (+b)")]
    BannedFromChan,

    #[error("cannot join channel (+i)")]
    InviteOnlyChan,

    #[error("cannot join channel (+l)")]
    ChannelIsFull,

    #[error("cannot join channel (+k)")]
    BadChannelKey,

    #[error("cannot send to channel")]
    CannotSendToChan(&'static str),

    #[error("too many channels")]
    TooManyChannels,
}

impl ChannelError {
    pub fn response(&self) -> Response {
        match self {
            Self::NotOnChannel => Response::ERR_NOTONCHANNEL,
            Self::ChanOpPrivsNeeded => Response::ERR_CHANOPRIVSNEEDED,
            Self::UserNotInChannel(_) => Response::ERR_USERNOTINCHANNEL,
            Self::UserOnChannel(_) => Response::ERR_USERONCHANNEL,
            Self::BannedFromChan => Response::ERR_BANNEDFROMCHAN,
            Self::InviteOnlyChan => Response::ERR_INVITEONLYCHAN,
            Self::ChannelIsFull => Response::ERR_CHANNELISFULL,
            Self::BadChannelKey => Response::ERR_BADCHANNELKEY,
            Self::CannotSendToChan(_) => Response::ERR_CANNOTSENDTOCHAN,
            Self::TooManyChannels => Response::ERR_TOOMANYCHANNELS,
        }
    }

    /// Parameters following the target nick.
    pub fn params<'a>(&'a self, channel: &'a str) -> Vec<&'a str> {
        match self {
            Self::NotOnChannel => vec![channel, "You're not on that channel"],
            Self::ChanOpPrivsNeeded => vec![channel, "You're not channel operator"],
            Self::UserNotInChannel(target) => vec![target.as_str(), channel, "They aren't on that channel"],
            Self::UserOnChannel(target) => vec![target.as_str(), channel, "is already on channel"],
            Self::BannedFromChan => vec![channel, "Cannot join channel (+b)"],
            Self::InviteOnlyChan => vec![channel, "Cannot join channel (+i)"],
            Self::ChannelIsFull => vec![channel, "Cannot join channel (+l)"],
            Self::BadChannelKey => vec![channel, "Cannot join channel (+k)"],
            Self::CannotSendToChan(reason) => vec![channel, *reason],
            Self::TooManyChannels => vec![channel, "You have joined too many channels"],
        }
    }

    /// Convert to an IRC error reply message.
    pub fn to_irc_reply(&self, server_name: &str, nick: &str, channel: &str) -> Message {
        numeric(server_name, nick, self.response(), &self.params(channel))
    }

    /// Queue this error on a responder.
    pub fn emit(&self, out: &mut crate::proto::Responder, channel: &str) {
        out.numeric(self.response(), &self.params(channel));
    }
}

// ============================================================================
// Mode Errors (registry and hierarchy)
// ============================================================================

/// Registration-time and configuration errors of the mode engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModeError {
    #[error("{mode_type} mode '{letter}' ({name}) is already registered")]
    DuplicateMode {
        letter: char,
        name: String,
        mode_type: &'static str,
    },

    #[error("unknown access level: {0}")]
    UnknownAccessLevel(String),

    #[error("invalid access hierarchy: {0}")]
    InvalidHierarchy(String),
}

// ============================================================================
// Module Errors (load time)
// ============================================================================

/// Errors aborting a module load. Nothing from the module stays registered.
#[derive(Debug, Error)]
pub enum ModuleError {
    #[error(transparent)]
    Mode(#[from] ModeError),

    #[error("command {0} is already registered")]
    DuplicateCommand(String),

    #[error("module {0} is already loaded")]
    AlreadyLoaded(String),
}
