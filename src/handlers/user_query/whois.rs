//! WHOIS command handler.

use super::is_oper;
use crate::error::{HandlerError, HandlerResult};
use crate::handlers::{Context, Handler, join_chunks};
use crate::proto::{Message, Response};
use async_trait::async_trait;

pub struct WhoisHandler;

#[async_trait]
impl Handler for WhoisHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        // WHOIS [server] <nick>
        let mask = msg.params.last().map(String::as_str).unwrap_or_default();
        let matrix = ctx.matrix;
        let viewer = ctx
            .user_snapshot()
            .ok_or_else(|| HandlerError::Internal("viewer vanished".into()))?;

        let Some(target) = matrix.find_user(mask).map(|u| u.read().clone()) else {
            ctx.out.numeric(Response::ERR_NOSUCHNICK, &[mask, "No such nick/channel"]);
            ctx.out.numeric(Response::RPL_ENDOFWHOIS, &[mask, "End of /WHOIS list"]);
            return Ok(());
        };

        ctx.out.numeric(
            Response::RPL_WHOISUSER,
            &[&target.nick, &target.user, &target.host, "*", &target.realname],
        );

        let mut entries = Vec::new();
        let mut names: Vec<&String> = target.channels().collect();
        names.sort();
        for name in names {
            let Some(handle) = matrix.channel(name) else {
                continue;
            };
            let channel = handle.read();
            if matrix.is_secret_for(&channel, &viewer) {
                continue;
            }
            let glyph = channel
                .access_of(&target.uid)
                .and_then(|access| matrix.hierarchy.prefix_glyph(access))
                .map(String::from)
                .unwrap_or_default();
            entries.push(format!("{}{}", glyph, channel.name));
        }
        if !entries.is_empty() {
            let budget = 504usize.saturating_sub(
                matrix.server_name().len() + "319".len() + viewer.nick.len() + target.nick.len(),
            );
            for line in join_chunks(&entries, budget) {
                ctx.out.numeric(Response::RPL_WHOISCHANNELS, &[&target.nick, &line]);
            }
        }

        ctx.out.numeric(
            Response::RPL_WHOISSERVER,
            &[&target.nick, &matrix.server_info.name, &matrix.server_info.description],
        );
        if is_oper(&target) {
            ctx.out
                .numeric(Response::RPL_WHOISOPERATOR, &[&target.nick, "is an IRC operator"]);
        }
        if let Some(ref away) = target.away {
            ctx.out.numeric(Response::RPL_AWAY, &[&target.nick, away]);
        }
        ctx.out.numeric(Response::RPL_ENDOFWHOIS, &[mask, "End of /WHOIS list"]);
        Ok(())
    }

    fn min_params(&self) -> usize {
        1
    }
}

#[cfg(test)]
mod tests {
    use crate::handlers::channel::test_support::*;
    use crate::modules::testing::grant_oper;

    #[tokio::test]
    async fn test_whois_reply_sequence() {
        let matrix = matrix();
        let _a = register(&matrix, "1", "alice");
        let _b = register(&matrix, "2", "bob");
        send(&matrix, "2", "JOIN #pub").await;
        send(&matrix, "2", "JOIN #hidden").await;
        send(&matrix, "2", "MODE #hidden +s").await;
        send(&matrix, "2", "AWAY :lunch").await;
        grant_oper(&matrix, "2");

        let lines = send(&matrix, "1", "WHOIS Bob").await;
        assert_eq!(
            lines,
            vec![
                ":irc.test 311 alice bob bob host * bob",
                ":irc.test 319 alice bob @#pub",
                ":irc.test 312 alice bob irc.test :modircd server",
                ":irc.test 313 alice bob :is an IRC operator",
                ":irc.test 301 alice bob lunch",
                ":irc.test 318 alice Bob :End of /WHOIS list",
            ]
        );

        // members see secret channels
        let lines = send(&matrix, "2", "WHOIS bob").await;
        assert_eq!(lines[1], ":irc.test 319 bob bob :@#hidden @#pub");
    }

    #[tokio::test]
    async fn test_whois_unknown_nick() {
        let matrix = matrix();
        let _a = register(&matrix, "1", "alice");
        let lines = send(&matrix, "1", "WHOIS irc.test ghost").await;
        assert_eq!(
            lines,
            vec![
                ":irc.test 401 alice ghost :No such nick/channel",
                ":irc.test 318 alice ghost :End of /WHOIS list",
            ]
        );
    }
}
