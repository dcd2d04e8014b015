//! WHO command handler.
//!
//! `WHO <mask> [o]`. A channel mask lists that channel's members, `0` or `*`
//! lists everyone, anything else is matched against nicks. Invisible users
//! only show up for themselves and for users sharing a channel with them.

use super::is_oper;
use crate::error::HandlerResult;
use crate::handlers::{Context, Handler};
use crate::proto::{Message, Response, is_channel_name, wildcard::matches_mask};
use crate::state::{Matrix, Uid, User};
use async_trait::async_trait;
use std::collections::HashSet;

pub struct WhoHandler;

struct Row {
    channel: Option<String>,
    uid: Uid,
    access: Option<String>,
}

#[async_trait]
impl Handler for WhoHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let mask = msg.arg(0).unwrap_or("*");
        let opers_only = msg.arg(1) == Some("o");
        let matrix = ctx.matrix;
        let Some(viewer) = ctx.user_snapshot() else {
            return Ok(());
        };
        let mut peers = matrix.common_channel_peers(ctx.uid);
        peers.insert(viewer.uid.clone());

        let rows = if is_channel_name(mask) {
            channel_rows(matrix, mask, &viewer)
        } else {
            user_rows(matrix, mask)
        };

        for row in rows {
            let Some(user) = matrix.user_snapshot(&row.uid) else {
                continue;
            };
            if !visible(&user, &peers) || (opers_only && !is_oper(&user)) {
                continue;
            }
            let mut flags = String::from(if user.away.is_some() { "G" } else { "H" });
            if is_oper(&user) {
                flags.push('*');
            }
            if let Some(ref access) = row.access {
                if viewer.has_cap("multi-prefix") {
                    flags.push_str(&matrix.hierarchy.all_prefix_glyphs(access));
                } else if let Some(glyph) = matrix.hierarchy.prefix_glyph(access) {
                    flags.push(glyph);
                }
            }
            let realname = format!("0 {}", user.realname);
            ctx.out.numeric(
                Response::RPL_WHOREPLY,
                &[
                    row.channel.as_deref().unwrap_or("*"),
                    &user.user,
                    &user.host,
                    matrix.server_name(),
                    &user.nick,
                    &flags,
                    &realname,
                ],
            );
        }

        ctx.out.numeric(Response::RPL_ENDOFWHO, &[mask, "End of /WHO list"]);
        Ok(())
    }
}

fn visible(user: &User, peers: &HashSet<Uid>) -> bool {
    !user.has_mode_named("invisible") || peers.contains(&user.uid)
}

fn channel_rows(matrix: &Matrix, name: &str, viewer: &User) -> Vec<Row> {
    let Some(handle) = matrix.channel(name) else {
        return Vec::new();
    };
    let channel = handle.read();
    if matrix.is_secret_for(&channel, viewer) {
        return Vec::new();
    }
    channel
        .members()
        .map(|(uid, access)| Row {
            channel: Some(channel.name.clone()),
            uid: uid.clone(),
            access: Some(access.to_string()),
        })
        .collect()
}

fn user_rows(matrix: &Matrix, mask: &str) -> Vec<Row> {
    let everyone = mask == "0" || mask == "*";
    let mut matched: Vec<(String, Uid)> = matrix
        .all_users()
        .iter()
        .map(|u| {
            let u = u.read();
            (u.nick.clone(), u.uid.clone())
        })
        .filter(|(nick, _)| everyone || matches_mask(nick, mask))
        .collect();
    matched.sort();
    matched
        .into_iter()
        .map(|(_, uid)| Row {
            channel: None,
            uid,
            access: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::handlers::channel::test_support::*;
    use crate::modules::testing::grant_oper;

    #[tokio::test]
    async fn test_who_channel_flags() {
        let matrix = matrix();
        let _a = register(&matrix, "1", "alice");
        let _b = register(&matrix, "2", "bob");
        send(&matrix, "1", "JOIN #a").await;
        send(&matrix, "2", "JOIN #a").await;
        send(&matrix, "2", "AWAY :gone").await;
        grant_oper(&matrix, "1");

        let lines = send(&matrix, "2", "WHO #a").await;
        assert_eq!(
            lines,
            vec![
                ":irc.test 352 bob #a alice host irc.test alice H*@ :0 alice",
                ":irc.test 352 bob #a bob host irc.test bob G :0 bob",
                ":irc.test 315 bob #a :End of /WHO list",
            ]
        );

        let lines = send(&matrix, "2", "WHO #a o").await;
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains(" alice H*@ "));
    }

    #[tokio::test]
    async fn test_who_hides_invisible_strangers() {
        let matrix = matrix();
        let _a = register(&matrix, "1", "alice");
        let _b = register(&matrix, "2", "bob");
        let _c = register(&matrix, "3", "carol");
        send(&matrix, "1", "JOIN #a").await;
        send(&matrix, "2", "JOIN #a").await;
        send(&matrix, "3", "MODE carol -i").await;

        // carol shares nothing with alice or bob, who are invisible
        let lines = send(&matrix, "3", "WHO *").await;
        assert_eq!(
            lines,
            vec![
                ":irc.test 352 carol * carol host irc.test carol H :0 carol",
                ":irc.test 315 carol * :End of /WHO list",
            ]
        );

        let lines = send(&matrix, "1", "WHO b*").await;
        assert_eq!(lines[0], ":irc.test 352 alice * bob host irc.test bob H :0 bob");
        assert_eq!(lines.len(), 2);

        // outsiders get nothing from a channel of invisible members
        let lines = send(&matrix, "3", "WHO #a").await;
        assert_eq!(lines, vec![":irc.test 315 carol #a :End of /WHO list"]);
    }
}
