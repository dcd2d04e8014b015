//! Secret channels (`+s`): hidden from non-members in LIST, NAMES and WHOIS.

use super::{Module, ModuleHost};
use crate::error::ModuleError;
use crate::hooks::{Hook, HookResult};
use crate::state::modes::ModeDefinition;

pub struct Secret;

impl Module for Secret {
    fn name(&self) -> &'static str {
        "secret"
    }

    fn load(&self, host: &mut ModuleHost<'_>) -> Result<(), ModuleError> {
        host.add_mode(ModeDefinition::channel_flag("secret", 's', "op"))?;
        host.add_hook(Hook::channel_visibility(|_, channel, _, visibility| {
            if channel.has_mode('s') {
                visibility.secret = true;
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
    fn test_secret_hidden_from_outsiders_only() {
        let matrix = matrix();
        let _a = register(&matrix, "1", "alice");
        let _b = register(&matrix, "2", "bob");
        let mut out = responder(&matrix, "alice");
        matrix.join_channel("1", "#s", None, &mut out).expect("join");
        matrix
            .apply_channel_modes("1", "#s", &[ModeChange::add('s', None)], &mut out)
            .expect("mode");

        let channel = matrix.channel("#s").expect("channel");
        let channel = channel.read();
        let alice = matrix.user_snapshot("1").expect("alice");
        let bob = matrix.user_snapshot("2").expect("bob");
        assert!(!matrix.is_secret_for(&channel, &alice));
        assert!(matrix.is_secret_for(&channel, &bob));

        let mut names = responder(&matrix, "alice");
        matrix.names_reply(&channel, &alice, &mut names);
        assert_eq!(names.replies()[0].params[1], "@");
    }
}
