//! Channel member limit (`+l`).

use super::{Module, ModuleHost};
use crate::error::{ChannelError, ModuleError};
use crate::hooks::{Hook, HookResult};
use crate::state::modes::{ModeCheck, ModeDefinition, ParamSpec};

pub struct ChannelLimit;

fn valid_limit(check: &ModeCheck<'_>) -> bool {
    if !check.action.is_add() {
        return true;
    }
    check
        .param
        .and_then(|p| p.parse::<usize>().ok())
        .is_some_and(|limit| limit > 0)
}

impl Module for ChannelLimit {
    fn name(&self) -> &'static str {
        "channel-limit"
    }

    fn load(&self, host: &mut ModuleHost<'_>) -> Result<(), ModuleError> {
        host.add_mode(
            ModeDefinition::channel_param("limit", 'l', ParamSpec::SetOnly, "op").with_validity_check(valid_limit),
        )?;
        host.add_hook(Hook::channel_join(|_, attempt, out| {
            let limit = attempt
                .channel
                .mode_param('l')
                .and_then(|l| l.parse::<usize>().ok());
            match limit {
                Some(limit) if attempt.channel.member_count() >= limit => {
                    ChannelError::ChannelIsFull.emit(out, &attempt.channel.name);
                    HookResult::Deny
                }
                _ => HookResult::Next,
            }
        }));
        Ok(())
    }
}
