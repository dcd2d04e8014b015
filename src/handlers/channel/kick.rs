//! KICK command handler.
//!
//! ## Syntax
//! ```text
//! KICK <channel> <user>{,<user>} [<comment>]
//! ```

use crate::error::{HandlerError, HandlerResult};
use crate::handlers::{Context, Handler, report, split_targets};
use crate::proto::Message;
use async_trait::async_trait;

pub struct KickHandler;

#[async_trait]
impl Handler for KickHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let (Some(channel), Some(targets)) = (msg.arg(0), msg.arg(1)) else {
            return Err(HandlerError::NeedMoreParams);
        };
        let kicker = ctx.nick();
        let reason = msg.arg(2).filter(|r| !r.is_empty()).unwrap_or(&kicker);
        let matrix = ctx.matrix;
        for target in split_targets(targets) {
            if let Err(e) = matrix.kick(ctx.uid, channel, target, reason, ctx.out) {
                report(ctx.out, "KICK", &e);
            }
        }
        Ok(())
    }

    fn min_params(&self) -> usize {
        2
    }

    fn channel_param(&self) -> Option<usize> {
        Some(0)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;

    #[tokio::test]
    async fn test_kick_defaults_reason_to_kicker() {
        let matrix = matrix();
        let _a = register(&matrix, "1", "alice");
        let mut bob = register(&matrix, "2", "bob");
        send(&matrix, "1", "JOIN #a").await;
        send(&matrix, "2", "JOIN #a").await;
        drain(&mut bob);

        let lines = send(&matrix, "2", "KICK #a alice").await;
        assert_eq!(lines, vec![":irc.test 482 bob #a :You're not channel operator"]);

        let lines = send(&matrix, "1", "KICK #a bob,ghost").await;
        assert_eq!(lines[0], ":alice!alice@host KICK #a bob alice");
        assert!(lines[1].starts_with(":irc.test 401 alice ghost "));
        assert_eq!(drain(&mut bob), vec![":alice!alice@host KICK #a bob alice"]);
        assert!(matrix.user_snapshot("2").expect("bob").channels().next().is_none());
    }
}
