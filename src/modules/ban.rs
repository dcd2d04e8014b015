//! Channel bans (`+b`) and ban exceptions (`+e`).

use super::{Module, ModuleHost};
use crate::error::{ChannelError, ModuleError};
use crate::hooks::{Hook, HookResult};
use crate::proto::Response;
use crate::state::modes::{ListReplies, ModeDefinition};

pub struct ChannelBan;

const BAN_REPLIES: ListReplies = ListReplies {
    entry: Response::RPL_BANLIST,
    end: Response::RPL_ENDOFBANLIST,
    end_text: "End of channel ban list",
};

const EXCEPT_REPLIES: ListReplies = ListReplies {
    entry: Response::RPL_EXCEPTLIST,
    end: Response::RPL_ENDOFEXCEPTLIST,
    end_text: "End of channel exception list",
};

impl Module for ChannelBan {
    fn name(&self) -> &'static str {
        "channel-ban"
    }

    fn load(&self, host: &mut ModuleHost<'_>) -> Result<(), ModuleError> {
        host.add_mode(ModeDefinition::channel_list("ban", 'b', "halfop", BAN_REPLIES))?;
        host.add_mode(ModeDefinition::channel_list("banException", 'e', "halfop", EXCEPT_REPLIES))?;
        host.add_hook(Hook::channel_join(|_, attempt, out| {
            let user = attempt.user;
            let lists = attempt.channel.lists();
            if lists.matches('b', &user.nick, &user.user, &user.host)
                && !lists.matches('e', &user.nick, &user.user, &user.host)
            {
                ChannelError::BannedFromChan.emit(out, &attempt.channel.name);
                return HookResult::Deny;
            }
            HookResult::Next
        }));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use crate::proto::ModeChange;

    #[test]
    fn test_ban_and_exception() {
        let matrix = matrix();
        let _a = register(&matrix, "1", "alice");
        let _b = register(&matrix, "2", "bob");
        let mut out = responder(&matrix, "alice");
        matrix.join_channel("1", "#b", None, &mut out).expect("join");
        matrix
            .apply_channel_modes("1", "#b", &[ModeChange::add('b', Some("bob!*@*"))], &mut out)
            .expect("mode");

        let mut bob = responder(&matrix, "bob");
        matrix.join_channel("2", "#b", None, &mut bob).expect("join");
        assert_eq!(commands(&mut bob), vec!["474"]);

        matrix
            .apply_channel_modes("1", "#b", &[ModeChange::add('e', Some("*!*@host"))], &mut out)
            .expect("mode");
        matrix.join_channel("2", "#b", None, &mut bob).expect("join");
        assert_eq!(commands(&mut bob)[0], "JOIN");
    }

    #[test]
    fn test_ban_records_creator_once() {
        let matrix = matrix();
        let _a = register(&matrix, "1", "alice");
        let mut v = register(&matrix, "2", "v");
        let mut out = responder(&matrix, "alice");
        matrix.join_channel("1", "#test", None, &mut out).expect("join");
        let mut vout = responder(&matrix, "v");
        matrix.join_channel("2", "#test", None, &mut vout).expect("join");
        while v.try_recv().is_ok() {}

        let ban = [ModeChange::add('b', Some("V!*@*"))];
        matrix.apply_channel_modes("1", "#test", &ban, &mut out).expect("mode");
        assert_eq!(v.try_recv().expect("mode").to_string(), ":alice!alice@host MODE #test +b V!*@*");
        matrix.apply_channel_modes("1", "#test", &ban, &mut out).expect("mode");
        assert!(v.try_recv().is_err());

        let channel = matrix.channel("#test").expect("channel");
        let channel = channel.read();
        let entries = channel.lists().entries('b');
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].creator, "alice");
    }
}
