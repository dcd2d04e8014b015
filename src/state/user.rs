//! User entity and user-mode processing.

use super::modes::{
    ModeCheck, ModeRegistry, ModeState, ModeType, StagedChange, modes_to_string, stage_change,
};
use super::{AccessHierarchy, Uid};
use crate::error::ModeError;
use crate::proto::{Action, ModeChange, Prefix, Responder, Response};
use std::collections::HashSet;
use std::sync::Arc;

/// Who is changing a user's modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserModeSource {
    /// The user's own MODE command.
    Client,
    /// A module granting modes (OPER, creation defaults). Skips access checks.
    Internal,
}

/// Reasons a nickname is refused before the uniqueness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NickProblem {
    Erroneous,
    InUse,
}

/// Check nickname syntax and truncate to `max_len`.
///
/// A nick is made of letters, digits and `[]{}|\^_-`, and is not all digits.
pub fn validate_nick(nick: &str, max_len: usize) -> Option<String> {
    if nick.is_empty() {
        return None;
    }
    let allowed = |c: char| {
        c.is_ascii_alphanumeric() || matches!(c, '[' | ']' | '{' | '}' | '|' | '\\' | '^' | '_' | '-')
    };
    if !nick.chars().all(allowed) || nick.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(nick.chars().take(max_len).collect())
}

/// A registered client.
#[derive(Debug, Clone)]
pub struct User {
    pub uid: Uid,
    pub nick: String,
    pub user: String,
    pub realname: String,
    pub host: String,
    /// Folded names of joined channels. Mutated only through Matrix::link / Matrix::unlink.
    pub(crate) channels: HashSet<String>,
    /// Capabilities negotiated by this client.
    pub caps: HashSet<String>,
    pub away: Option<String>,
    pub created_at: i64,
    modes: Vec<ModeState>,
}

impl User {
    pub fn new(uid: Uid, nick: String, user: String, realname: String, host: String) -> Self {
        Self {
            uid,
            nick,
            user,
            realname,
            host,
            channels: HashSet::new(),
            caps: HashSet::new(),
            away: None,
            created_at: chrono::Utc::now().timestamp(),
            modes: Vec::new(),
        }
    }

    /// `nick!user@host` source prefix.
    pub fn prefix(&self) -> Prefix {
        Prefix::Nickname(self.nick.clone(), self.user.clone(), self.host.clone())
    }

    pub fn channels(&self) -> impl Iterator<Item = &String> {
        self.channels.iter()
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn has_cap(&self, cap: &str) -> bool {
        self.caps.contains(cap)
    }

    pub fn has_mode(&self, letter: char) -> bool {
        self.modes.iter().any(|m| m.letter() == letter)
    }

    pub fn has_mode_named(&self, name: &str) -> bool {
        self.modes.iter().any(|m| m.def.name == name)
    }

    pub fn modes_as_string(&self) -> String {
        modes_to_string(&self.modes)
    }

    /// Diff a batch of user-mode changes and commit it.
    ///
    /// Flags only: no prefix or list modes. Unknown letters answer 501;
    /// refused changes are dropped silently. Returns the applied changes.
    pub fn process_modes(
        &mut self,
        changes: &[ModeChange],
        source: UserModeSource,
        registry: &ModeRegistry,
        hierarchy: &AccessHierarchy,
        out: &mut Responder,
    ) -> Result<Vec<ModeChange>, ModeError> {
        let mut resulting = self.modes.clone();
        let mut staged: Vec<StagedChange> = Vec::new();
        let mut reported_unknown = false;

        for change in changes {
            let Some(def) = registry.find_by_letter(change.letter, ModeType::User) else {
                if !reported_unknown {
                    out.numeric(Response::ERR_UMODEUNKNOWNFLAG, &["Unknown MODE flag"]);
                    reported_unknown = true;
                }
                continue;
            };
            let pos = resulting.iter().position(|m| m.letter() == def.letter);
            if pos.is_some() == change.action.is_add() {
                continue;
            }
            let check = ModeCheck {
                actor_access: "",
                hierarchy,
                action: change.action,
                param: None,
                current: None,
            };
            if source == UserModeSource::Client && !def.check_access(&check)? {
                continue;
            }
            if !def.check_validity(&check) {
                continue;
            }
            match (change.action, pos) {
                (Action::Add, _) => resulting.push(ModeState::new(Arc::clone(&def), None)),
                (Action::Remove, Some(i)) => {
                    resulting.remove(i);
                }
                (Action::Remove, None) => continue,
            }
            stage_change(
                &mut staged,
                StagedChange {
                    change: ModeChange {
                        letter: def.letter,
                        action: change.action,
                        param: None,
                    },
                    slot: None,
                    identity: None,
                    replaced: None,
                },
            );
        }

        if staged.is_empty() {
            return Ok(Vec::new());
        }
        resulting.sort_by(ModeState::sort_order);
        self.modes = resulting;
        Ok(staged.into_iter().map(|s| s.change).collect())
    }
}
