//! Command handler registry and dispatch.
//!
//! The `Registry` maps verbs to handlers. Verbs are claimed first-come:
//! a second registration of the same verb is refused and reported to the
//! registrant. Each verb remembers the module that owns it so an unload can
//! release all of them.

use super::context::Context;
use super::traits::{Handler, HandlerPhase};
use crate::error::{HandlerError, HandlerResult, ModeError};
use crate::proto::{Message, is_channel_name};
use crate::telemetry::{CommandTimer, command_span};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{Instrument, debug, error};

struct Entry {
    owner: String,
    handler: Arc<dyn Handler>,
}

/// Registry of command handlers.
#[derive(Default)]
pub struct Registry {
    handlers: RwLock<HashMap<String, Entry>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `verb` for `owner`. Returns false when the verb is taken.
    pub fn register(&self, owner: &str, verb: &str, handler: Arc<dyn Handler>) -> bool {
        let verb = verb.to_ascii_uppercase();
        let mut handlers = self.handlers.write();
        if handlers.contains_key(&verb) {
            return false;
        }
        debug!(command = %verb, module = %owner, "Command registered");
        handlers.insert(
            verb,
            Entry {
                owner: owner.to_string(),
                handler,
            },
        );
        true
    }

    /// Release every verb owned by `owner`. Returns how many were removed.
    pub fn unregister_owner(&self, owner: &str) -> usize {
        let mut handlers = self.handlers.write();
        let before = handlers.len();
        handlers.retain(|_, e| e.owner != owner);
        before - handlers.len()
    }

    pub fn contains(&self, verb: &str) -> bool {
        self.handlers.read().contains_key(&verb.to_ascii_uppercase())
    }

    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, verb: &str) -> Option<Arc<dyn Handler>> {
        self.handlers.read().get(verb).map(|e| Arc::clone(&e.handler))
    }

    /// Dispatch one inbound command.
    ///
    /// Client-facing failures become numeric replies on `ctx.out`; the only
    /// error returned is [`HandlerError::Quit`], which ends the connection.
    pub async fn dispatch(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let verb = msg.command_name();
        let span = command_span(&verb, ctx.uid, msg.arg(0));
        let _timer = CommandTimer::new(verb.as_str());

        let result = match self.lookup(&verb) {
            None => Err(HandlerError::UnknownCommand(verb.clone())),
            Some(handler) => match precheck(handler.as_ref(), ctx, msg) {
                Err(e) => Err(e),
                Ok(()) => handler.handle(ctx, msg).instrument(span).await,
            },
        };

        match result {
            Ok(()) => Ok(()),
            Err(HandlerError::Quit(reason)) => Err(HandlerError::Quit(reason)),
            Err(e) => {
                match &e {
                    HandlerError::Mode(ModeError::UnknownAccessLevel(_)) | HandlerError::Internal(_) => {
                        error!(command = %verb, uid = %ctx.uid, error = %e, "Command failed");
                    }
                    _ => debug!(command = %verb, uid = %ctx.uid, code = e.error_code(), error = %e, "Command error"),
                }
                if let Some(reply) = e.to_irc_reply(ctx.server_name(), ctx.out.me(), &verb) {
                    ctx.out.send(reply);
                }
                Ok(())
            }
        }
    }
}

fn precheck(handler: &dyn Handler, ctx: &Context<'_>, msg: &Message) -> HandlerResult {
    let registered = ctx.session.is_registered();
    match handler.phase() {
        HandlerPhase::Registered if !registered => return Err(HandlerError::NotRegistered),
        HandlerPhase::PreRegistration if registered => return Err(HandlerError::AlreadyRegistered),
        _ => {}
    }
    if msg.params.len() < handler.min_params() {
        return Err(HandlerError::NeedMoreParams);
    }
    if let Some(index) = handler.channel_param()
        && let Some(name) = msg.arg(index)
        && !name.split(',').all(is_channel_name)
    {
        return Err(HandlerError::NoSuchChannel(name.to_string()));
    }
    Ok(())
}
