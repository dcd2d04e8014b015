//! Moderated channels (`+m`): only voiced members and above may speak.

use super::{Module, ModuleHost, member_at_least};
use crate::error::{ChannelError, ModuleError};
use crate::hooks::{Hook, HookResult, MessageKind};
use crate::state::modes::ModeDefinition;

pub struct Moderated;

impl Module for Moderated {
    fn name(&self) -> &'static str {
        "moderated"
    }

    fn load(&self, host: &mut ModuleHost<'_>) -> Result<(), ModuleError> {
        host.add_mode(ModeDefinition::channel_flag("moderated", 'm', "halfop"))?;
        for kind in [MessageKind::Privmsg, MessageKind::Notice, MessageKind::Tagmsg] {
            host.add_hook(Hook::channel_message(kind, |matrix, channel, user, _, out| {
                if channel.has_mode('m') && !member_at_least(matrix, channel, &user.uid, "voice") {
                    ChannelError::CannotSendToChan("Cannot send to channel (+m)").emit(out, &channel.name);
                    return HookResult::Deny;
                }
                HookResult::Next
            }));
        }
        Ok(())
    }
}
