//! PART command handler.
//!
//! ## Syntax
//! ```text
//! PART <channels> [<reason>]
//! ```

use crate::error::{HandlerError, HandlerResult};
use crate::handlers::{Context, Handler, report, split_targets};
use crate::proto::Message;
use async_trait::async_trait;

pub struct PartHandler;

#[async_trait]
impl Handler for PartHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let targets = msg.arg(0).ok_or(HandlerError::NeedMoreParams)?;
        let reason = msg.arg(1).filter(|r| !r.is_empty());
        let matrix = ctx.matrix;
        for name in split_targets(targets) {
            if let Err(e) = matrix.part_channel(ctx.uid, name, reason, ctx.out) {
                report(ctx.out, "PART", &e);
            }
        }
        Ok(())
    }

    fn min_params(&self) -> usize {
        1
    }

    fn channel_param(&self) -> Option<usize> {
        Some(0)
    }
}
