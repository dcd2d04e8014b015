//! Server-owned set of registered modes.

use super::{ModeDefinition, ModeKind, ModeType, ParamSpec};
use crate::error::ModeError;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

/// Registered channel and user modes, unique per (type, letter) and
/// (type, name). All access goes through these methods.
#[derive(Debug, Default)]
pub struct ModeRegistry {
    modes: RwLock<Vec<Arc<ModeDefinition>>>,
}

impl ModeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition. Definitions are immutable afterwards.
    pub fn register(&self, def: ModeDefinition) -> Result<Arc<ModeDefinition>, ModeError> {
        let mut modes = self.modes.write();
        if modes.iter().any(|m| {
            m.mode_type == def.mode_type && (m.letter == def.letter || m.name == def.name)
        }) {
            return Err(ModeError::DuplicateMode {
                letter: def.letter,
                name: def.name,
                mode_type: def.mode_type.as_str(),
            });
        }
        debug!(mode = %def.name, letter = %def.letter, kind = %def.mode_type, "Mode registered");
        let def = Arc::new(def);
        modes.push(Arc::clone(&def));
        Ok(def)
    }

    /// Remove a previously registered definition. Returns whether it was present.
    pub fn unregister(&self, def: &Arc<ModeDefinition>) -> bool {
        let mut modes = self.modes.write();
        let before = modes.len();
        modes.retain(|m| !Arc::ptr_eq(m, def));
        before != modes.len()
    }

    pub fn find_by_letter(&self, letter: char, mode_type: ModeType) -> Option<Arc<ModeDefinition>> {
        self.modes
            .read()
            .iter()
            .find(|m| m.mode_type == mode_type && m.letter == letter)
            .cloned()
    }

    pub fn find_by_name(&self, name: &str, mode_type: ModeType) -> Option<Arc<ModeDefinition>> {
        self.modes
            .read()
            .iter()
            .find(|m| m.mode_type == mode_type && m.name == name)
            .cloned()
    }

    fn sorted_letters<F>(&self, filter: F) -> String
    where
        F: Fn(&ModeDefinition) -> bool,
    {
        let mut letters: Vec<char> = self
            .modes
            .read()
            .iter()
            .filter(|m| filter(m))
            .map(|m| m.letter)
            .collect();
        letters.sort_unstable();
        letters.into_iter().collect()
    }

    pub fn user_mode_letters(&self) -> String {
        self.sorted_letters(|m| m.mode_type == ModeType::User)
    }

    pub fn channel_mode_letters(&self) -> String {
        self.sorted_letters(|m| m.mode_type == ModeType::Channel)
    }

    /// `CHANMODES` value: list, always-param, set-only-param, no-param.
    pub fn chanmodes_token(&self) -> String {
        let channel = |m: &ModeDefinition| m.mode_type == ModeType::Channel;
        let list = self.sorted_letters(|m| channel(m) && matches!(m.kind, ModeKind::List(_)));
        let always = self.sorted_letters(|m| {
            channel(m) && m.kind == ModeKind::Flag && m.param_spec == ParamSpec::Always
        });
        let set_only = self.sorted_letters(|m| channel(m) && m.param_spec == ParamSpec::SetOnly);
        let never = self.sorted_letters(|m| channel(m) && m.param_spec == ParamSpec::Never);
        format!("{},{},{},{}", list, always, set_only, never)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::Response;
    use crate::state::modes::ListReplies;

    const BANS: ListReplies = ListReplies {
        entry: Response::RPL_BANLIST,
        end: Response::RPL_ENDOFBANLIST,
        end_text: "End of channel ban list",
    };

    #[test]
    fn test_register_and_find() {
        let registry = ModeRegistry::new();
        registry
            .register(ModeDefinition::channel_flag("moderated", 'm', "halfop"))
            .expect("register");
        assert!(registry.find_by_letter('m', ModeType::Channel).is_some());
        assert!(registry.find_by_name("moderated", ModeType::Channel).is_some());
        assert!(registry.find_by_letter('m', ModeType::User).is_none());
    }

    #[test]
    fn test_duplicate_letter_rejected() {
        let registry = ModeRegistry::new();
        registry
            .register(ModeDefinition::channel_flag("moderated", 'm', "halfop"))
            .expect("register");
        let err = registry
            .register(ModeDefinition::channel_flag("muted", 'm', "op"))
            .unwrap_err();
        assert!(matches!(err, ModeError::DuplicateMode { letter: 'm', .. }));
    }

    #[test]
    fn test_duplicate_name_rejected_same_type_only() {
        let registry = ModeRegistry::new();
        registry
            .register(ModeDefinition::channel_flag("invite", 'i', "op"))
            .expect("register");
        assert!(
            registry
                .register(ModeDefinition::channel_flag("invite", 'I', "op"))
                .is_err()
        );
        // Same letter on the user side is a different namespace.
        registry
            .register(ModeDefinition::user_flag("invisible", 'i'))
            .expect("user mode");
    }

    #[test]
    fn test_unregister() {
        let registry = ModeRegistry::new();
        let def = registry
            .register(ModeDefinition::channel_flag("secret", 's', "op"))
            .expect("register");
        assert!(registry.unregister(&def));
        assert!(!registry.unregister(&def));
        assert!(registry.find_by_letter('s', ModeType::Channel).is_none());
    }

    #[test]
    fn test_chanmodes_token_groups() {
        let registry = ModeRegistry::new();
        for def in [
            ModeDefinition::channel_list("ban", 'b', "halfop", BANS),
            ModeDefinition::channel_param("key", 'k', ParamSpec::Always, "op"),
            ModeDefinition::channel_param("limit", 'l', ParamSpec::SetOnly, "op"),
            ModeDefinition::channel_flag("noExternal", 'n', "op"),
            ModeDefinition::channel_flag("moderated", 'm', "halfop"),
            ModeDefinition::user_flag("invisible", 'i'),
        ] {
            registry.register(def).expect("register");
        }
        assert_eq!(registry.chanmodes_token(), "b,k,l,mn");
        assert_eq!(registry.user_mode_letters(), "i");
    }
}
