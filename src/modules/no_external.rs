//! No external messages (`+n`), set on every new channel.

use super::{Module, ModuleHost};
use crate::error::{ChannelError, ModuleError};
use crate::hooks::{Hook, HookResult, MessageKind};
use crate::proto::ModeChange;
use crate::state::modes::ModeDefinition;

pub struct NoExternalMessages;

impl Module for NoExternalMessages {
    fn name(&self) -> &'static str {
        "no-external-messages"
    }

    fn load(&self, host: &mut ModuleHost<'_>) -> Result<(), ModuleError> {
        host.add_mode(ModeDefinition::channel_flag("noExternalMessages", 'n', "op"))?;
        host.add_hook(Hook::after_channel_create(|_, _, _, modes| {
            modes.push(ModeChange::add('n', None));
            HookResult::Next
        }));
        for kind in [MessageKind::Privmsg, MessageKind::Notice, MessageKind::Tagmsg] {
            host.add_hook(Hook::channel_message(kind, |_, channel, user, _, out| {
                if channel.has_mode('n') && !channel.is_member(&user.uid) {
                    ChannelError::CannotSendToChan("Cannot send to channel (no external messages)")
                        .emit(out, &channel.name);
                    return HookResult::Deny;
                }
                HookResult::Next
            }));
        }
        Ok(())
    }
}
