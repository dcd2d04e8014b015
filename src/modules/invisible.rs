//! Invisible users (`+i`), granted at registration.

use super::{Module, ModuleHost};
use crate::error::ModuleError;
use crate::hooks::{Hook, HookResult};
use crate::proto::ModeChange;
use crate::state::modes::ModeDefinition;

pub struct Invisible;

impl Module for Invisible {
    fn name(&self) -> &'static str {
        "invisible"
    }

    fn load(&self, host: &mut ModuleHost<'_>) -> Result<(), ModuleError> {
        host.add_mode(ModeDefinition::user_flag("invisible", 'i'))?;
        host.add_hook(Hook::user_create(|_, _, modes| {
            modes.push(ModeChange::add('i', None));
            HookResult::Next
        }));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use crate::proto::ModeChange;
    use crate::state::UserModeSource;

    #[test]
    fn test_new_users_are_invisible() {
        let matrix = matrix();
        let _a = register(&matrix, "1", "alice");
        assert!(matrix.user_snapshot("1").expect("alice").has_mode('i'));

        let mut out = responder(&matrix, "alice");
        let applied = matrix
            .apply_user_modes("1", &[ModeChange::remove('i', None)], UserModeSource::Client, &mut out)
            .expect("mode");
        assert_eq!(applied.len(), 1);
        assert!(!matrix.user_snapshot("1").expect("alice").has_mode('i'));
    }
}
