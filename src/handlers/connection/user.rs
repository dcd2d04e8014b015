//! USER command handler.

use crate::error::HandlerResult;
use crate::handlers::{Context, Handler, HandlerPhase, complete_registration};
use crate::proto::Message;
use async_trait::async_trait;

/// `USER <username> <mode> <unused> <realname>`
pub struct UserHandler;

#[async_trait]
impl Handler for UserHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let username = msg.params[0].clone();
        let realname = msg.params[3].clone();
        let progress = ctx.session.gate.set_user(username, realname);
        complete_registration(ctx, progress);
        Ok(())
    }

    fn phase(&self) -> HandlerPhase {
        HandlerPhase::PreRegistration
    }

    fn min_params(&self) -> usize {
        4
    }
}
