//! NICK command handler.

use crate::error::{HandlerError, HandlerResult};
use crate::handlers::{Context, Handler, HandlerPhase, complete_registration};
use crate::proto::Message;
use crate::state::{NickProblem, validate_nick};
use async_trait::async_trait;
use tracing::debug;

/// `NICK <nickname>`
///
/// Before registration only the syntax is checked; the nick is claimed when
/// the registration gate opens.
pub struct NickHandler;

#[async_trait]
impl Handler for NickHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let requested = msg
            .arg(0)
            .filter(|n| !n.is_empty())
            .ok_or(HandlerError::NoNicknameGiven)?;
        let nick = validate_nick(requested, ctx.matrix.config.limits.nick_len)
            .ok_or_else(|| HandlerError::ErroneousNickname(requested.to_string()))?;

        if !ctx.session.is_registered() {
            debug!(uid = %ctx.uid, %nick, "Pending nick set");
            let progress = ctx.session.gate.set_nick(nick);
            complete_registration(ctx, progress);
            return Ok(());
        }

        match ctx.matrix.change_nick(ctx.uid, &nick, ctx.out) {
            Ok(()) => Ok(()),
            Err(NickProblem::InUse) => Err(HandlerError::NicknameInUse(nick)),
            Err(NickProblem::Erroneous) => Err(HandlerError::ErroneousNickname(nick)),
        }
    }

    fn phase(&self) -> HandlerPhase {
        HandlerPhase::Any
    }
}
