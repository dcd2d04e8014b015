//! MODE command handler.
//!
//! Routes to the channel or user variant by target. Channel batches go
//! through the mode engine in one piece and are broadcast once.

mod channel;
mod user;

use crate::error::{HandlerError, HandlerResult};
use crate::handlers::{Context, Handler};
use crate::proto::{Message, is_channel_name};
use async_trait::async_trait;

/// `MODE <target> [<modestring> [<params>...]]`
pub struct ModeHandler;

#[async_trait]
impl Handler for ModeHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let target = msg.arg(0).ok_or(HandlerError::NeedMoreParams)?;
        let args = &msg.params[1..];
        if is_channel_name(target) {
            channel::handle(ctx, target, args)
        } else {
            user::handle(ctx, target, args)
        }
    }

    fn min_params(&self) -> usize {
        1
    }
}
