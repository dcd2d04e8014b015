//! Topic lock (`+t`), set on every new channel.

use super::{Module, ModuleHost, member_at_least};
use crate::error::{ChannelError, ModuleError};
use crate::hooks::{Hook, HookResult};
use crate::proto::ModeChange;
use crate::state::modes::ModeDefinition;

pub struct TopicLock;

impl Module for TopicLock {
    fn name(&self) -> &'static str {
        "topic-lock"
    }

    fn load(&self, host: &mut ModuleHost<'_>) -> Result<(), ModuleError> {
        host.add_mode(ModeDefinition::channel_flag("topicLock", 't', "op"))?;
        host.add_hook(Hook::after_channel_create(|_, _, _, modes| {
            modes.push(ModeChange::add('t', None));
            HookResult::Next
        }));
        host.add_hook(Hook::pre_topic_change(|matrix, channel, user, _, out| {
            if channel.has_mode('t') && !member_at_least(matrix, channel, &user.uid, "op") {
                ChannelError::ChanOpPrivsNeeded.emit(out, &channel.name);
                return HookResult::Deny;
            }
            HookResult::Next
        }));
        Ok(())
    }
}
