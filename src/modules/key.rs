//! Channel key (`+k`).

use super::{Module, ModuleHost};
use crate::error::{ChannelError, ModuleError};
use crate::hooks::{Hook, HookResult};
use crate::state::modes::{ModeCheck, ModeDefinition, ParamSpec};

pub struct ChannelKey;

fn valid_key(check: &ModeCheck<'_>) -> bool {
    let Some(param) = check.param else {
        return false;
    };
    if check.action.is_add() {
        !param.is_empty() && !param.contains([' ', ','])
    } else {
        check.current == Some(param)
    }
}

impl Module for ChannelKey {
    fn name(&self) -> &'static str {
        "channel-key"
    }

    fn load(&self, host: &mut ModuleHost<'_>) -> Result<(), ModuleError> {
        host.add_mode(
            ModeDefinition::channel_param("key", 'k', ParamSpec::Always, "op").with_validity_check(valid_key),
        )?;
        host.add_hook(Hook::channel_join(|_, attempt, out| {
            let Some(key) = attempt.channel.mode_param('k') else {
                return HookResult::Next;
            };
            if attempt.key == Some(key) {
                return HookResult::Next;
            }
            ChannelError::BadChannelKey.emit(out, &attempt.channel.name);
            HookResult::Deny
        }));
        Ok(())
    }
}
