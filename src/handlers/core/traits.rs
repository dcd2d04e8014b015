//! Handler trait and registration phases.
//!
//! ## Phases
//!
//! - [`HandlerPhase::PreRegistration`]: NICK-less bootstrap commands (USER).
//!   Rejected with `ERR_ALREADYREGISTRED` once the connection is registered.
//! - [`HandlerPhase::Registered`]: commands requiring a registered
//!   connection (JOIN, PRIVMSG, ...). Rejected with `ERR_NOTREGISTERED`
//!   before registration.
//! - [`HandlerPhase::Any`]: commands valid in both states (NICK, CAP, PING,
//!   QUIT).
//!
//! The [`Registry`](super::Registry) enforces the phase and the parameter
//! requirements before calling [`Handler::handle`], so handler bodies never
//! re-check them.

use super::context::Context;
use crate::error::HandlerResult;
use crate::proto::Message;
use async_trait::async_trait;

/// When a command may be issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerPhase {
    PreRegistration,
    Registered,
    Any,
}

#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult;

    fn phase(&self) -> HandlerPhase {
        HandlerPhase::Registered
    }

    /// Parameters that must be present; fewer yields `ERR_NEEDMOREPARAMS`.
    fn min_params(&self) -> usize {
        0
    }

    /// Index of a parameter that must name a channel; a mismatch yields
    /// `ERR_NOSUCHCHANNEL`.
    fn channel_param(&self) -> Option<usize> {
        None
    }
}
