//! JOIN command handler.
//!
//! ## Syntax
//! ```text
//! JOIN <channel>{,<channel>} [<key>{,<key>}]
//! JOIN 0
//! ```
//!
//! Keys pair with channels by position. `JOIN 0` parts every channel.
//! Failures are reported per channel; the remaining channels are still
//! joined.

use crate::error::{HandlerError, HandlerResult};
use crate::handlers::{Context, Handler, report, split_targets};
use crate::proto::{Message, is_channel_name};
use async_trait::async_trait;

pub struct JoinHandler;

#[async_trait]
impl Handler for JoinHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let targets = msg.arg(0).ok_or(HandlerError::NeedMoreParams)?;
        let matrix = ctx.matrix;
        if targets == "0" {
            matrix.part_all(ctx.uid, ctx.out);
            return Ok(());
        }

        let keys: Vec<&str> = msg.arg(1).map(|k| k.split(',').collect()).unwrap_or_default();
        let max_len = matrix.config.limits.channel_len;
        for (i, name) in split_targets(targets).enumerate() {
            if !is_channel_name(name) || name.len() > max_len {
                report(ctx.out, "JOIN", &HandlerError::NoSuchChannel(name.to_string()));
                continue;
            }
            let key = keys.get(i).copied().filter(|k| !k.is_empty());
            if let Err(e) = matrix.join_channel(ctx.uid, name, key, ctx.out) {
                report(ctx.out, "JOIN", &e);
            }
        }
        Ok(())
    }

    fn min_params(&self) -> usize {
        1
    }
}
