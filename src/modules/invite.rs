//! Invite-only channels (`+i`) and the INVITE command.

use super::{Module, ModuleHost, member_at_least};
use crate::error::{ChannelError, HandlerError, HandlerResult, ModuleError};
use crate::handlers::{Context, Handler};
use crate::hooks::{Hook, HookResult};
use crate::proto::{Message, Response};
use crate::state::modes::ModeDefinition;
use async_trait::async_trait;
use tracing::debug;

pub struct InviteOnly;

impl Module for InviteOnly {
    fn name(&self) -> &'static str {
        "invite-only"
    }

    fn load(&self, host: &mut ModuleHost<'_>) -> Result<(), ModuleError> {
        host.add_mode(ModeDefinition::channel_flag("inviteOnly", 'i', "op"))?;
        host.add_command("INVITE", InviteHandler)?;
        host.add_hook(Hook::channel_join(|matrix, attempt, out| {
            if !attempt.channel.has_mode('i') {
                return HookResult::Next;
            }
            if matrix
                .invites
                .contains(&attempt.user.uid, &attempt.channel.folded_name())
            {
                return HookResult::Next;
            }
            ChannelError::InviteOnlyChan.emit(out, &attempt.channel.name);
            HookResult::Deny
        }));
        host.add_hook(Hook::user_destroy(|matrix, user| {
            let purged = matrix.invites.purge_user(&user.uid);
            if purged > 0 {
                debug!(uid = %user.uid, purged, "Dropped pending invites");
            }
            HookResult::Next
        }));
        Ok(())
    }
}

/// `INVITE <nick> <channel>`
struct InviteHandler;

#[async_trait]
impl Handler for InviteHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let (Some(target_nick), Some(name)) = (msg.arg(0), msg.arg(1)) else {
            return Err(HandlerError::NeedMoreParams);
        };
        let matrix = ctx.matrix;
        let target_uid = matrix
            .find_uid(target_nick)
            .ok_or_else(|| HandlerError::NoSuchNick(target_nick.to_string()))?;
        let handle = matrix
            .channel(name)
            .ok_or_else(|| HandlerError::NoSuchChannel(name.to_string()))?;
        let inviter = ctx
            .user_snapshot()
            .ok_or_else(|| HandlerError::Internal("inviter vanished".into()))?;

        let (channel_name, folded) = {
            let channel = handle.read();
            if !channel.is_member(ctx.uid) {
                ChannelError::NotOnChannel.emit(ctx.out, &channel.name);
                return Ok(());
            }
            if channel.is_member(&target_uid) {
                ChannelError::UserOnChannel(target_nick.to_string()).emit(ctx.out, &channel.name);
                return Ok(());
            }
            if channel.has_mode('i') && !member_at_least(matrix, &channel, ctx.uid, "op") {
                ChannelError::ChanOpPrivsNeeded.emit(ctx.out, &channel.name);
                return Ok(());
            }
            (channel.name.clone(), channel.folded_name())
        };

        let Some(target) = matrix.user_snapshot(&target_uid) else {
            return Err(HandlerError::NoSuchNick(target_nick.to_string()));
        };
        matrix.invites.add(&target_uid, &folded, ctx.uid);
        ctx.out
            .numeric(Response::RPL_INVITING, &[&target.nick, &channel_name]);
        matrix.send_to(
            &target_uid,
            Message::new("INVITE", [target.nick.as_str(), channel_name.as_str()])
                .with_prefix(inviter.prefix()),
        );
        Ok(())
    }

    fn min_params(&self) -> usize {
        2
    }

    fn channel_param(&self) -> Option<usize> {
        Some(1)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use crate::proto::ModeChange;
    use std::sync::Arc;

    fn codes(replies: Vec<crate::proto::Message>) -> Vec<String> {
        replies.into_iter().map(|m| m.command).collect()
    }

    #[tokio::test]
    async fn test_invite_lets_user_into_invite_only_channel() {
        let matrix = Arc::new(matrix());
        let _a = register(&matrix, "1", "alice");
        let mut bob_rx = register(&matrix, "2", "bob");
        let mut out = responder(&matrix, "alice");
        matrix.join_channel("1", "#inv", None, &mut out).expect("join");
        matrix
            .apply_channel_modes("1", "#inv", &[ModeChange::add('i', None)], &mut out)
            .expect("mode");

        let mut bob = responder(&matrix, "bob");
        matrix.join_channel("2", "#inv", None, &mut bob).expect("join");
        assert_eq!(commands(&mut bob), vec!["473"]);

        assert_eq!(codes(run(&matrix, "1", "INVITE bob #inv").await), vec!["341"]);
        let invite = bob_rx.try_recv().expect("invite");
        assert_eq!(invite.to_string(), ":alice!alice@host INVITE bob #inv");

        matrix.join_channel("2", "#inv", None, &mut bob).expect("join");
        assert_eq!(commands(&mut bob)[0], "JOIN");
        assert!(matrix.invites.is_empty());
    }

    #[tokio::test]
    async fn test_invite_errors() {
        let matrix = Arc::new(matrix());
        let _a = register(&matrix, "1", "alice");
        let _b = register(&matrix, "2", "bob");
        let _c = register(&matrix, "3", "carol");
        let mut out = responder(&matrix, "alice");
        matrix.join_channel("1", "#inv", None, &mut out).expect("join");

        assert_eq!(codes(run(&matrix, "1", "INVITE bob").await), vec!["461"]);
        assert_eq!(codes(run(&matrix, "1", "INVITE nobody #inv").await), vec!["401"]);
        assert_eq!(codes(run(&matrix, "1", "INVITE bob #none").await), vec!["403"]);
        assert_eq!(codes(run(&matrix, "2", "INVITE carol #inv").await), vec!["442"]);
        assert_eq!(codes(run(&matrix, "1", "INVITE alice #inv").await), vec!["443"]);

        let mut bob = responder(&matrix, "bob");
        matrix.join_channel("2", "#inv", None, &mut bob).expect("join");
        matrix
            .apply_channel_modes("1", "#inv", &[ModeChange::add('i', None)], &mut out)
            .expect("mode");
        assert_eq!(codes(run(&matrix, "2", "INVITE carol #inv").await), vec!["482"]);
    }

    #[tokio::test]
    async fn test_invite_does_not_survive_channel_destruction() {
        let matrix = Arc::new(matrix());
        let _a = register(&matrix, "1", "alice");
        let _b = register(&matrix, "2", "bob");
        let _c = register(&matrix, "3", "carol");
        let mut alice = responder(&matrix, "alice");
        matrix.join_channel("1", "#x", None, &mut alice).expect("join");
        assert_eq!(codes(run(&matrix, "1", "INVITE bob #x").await), vec!["341"]);
        matrix.part_channel("1", "#x", None, &mut alice).expect("part");
        assert!(matrix.channel("#x").is_none());
        assert!(matrix.invites.is_empty());

        let mut carol = responder(&matrix, "carol");
        matrix.join_channel("3", "#x", None, &mut carol).expect("join");
        matrix
            .apply_channel_modes("3", "#x", &[ModeChange::add('i', None)], &mut carol)
            .expect("mode");
        let mut bob = responder(&matrix, "bob");
        matrix.join_channel("2", "#x", None, &mut bob).expect("join");
        assert_eq!(commands(&mut bob), vec!["473"]);
    }

    #[test]
    fn test_invites_purged_on_disconnect() {
        let matrix = matrix();
        let _a = register(&matrix, "1", "alice");
        let _b = register(&matrix, "2", "bob");
        matrix.invites.add("2", "#inv", "1");
        assert!(matrix.destroy_connection("2", "Client Quit"));
        assert!(matrix.invites.is_empty());
    }
}
