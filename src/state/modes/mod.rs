//! Mode definitions.
//!
//! A [`ModeDefinition`] is a plain struct with a small capability set: its
//! parameter cardinality, an optional access check and an optional validity
//! check. List modes (bans, exceptions) are the [`ModeKind::List`] variant
//! and keep their entries in a [`ListModeStore`] rather than in the
//! entity's mode slots.

mod list;
mod registry;

pub use list::{ListEntry, ListModeStore, ListSession};
pub use registry::ModeRegistry;

use crate::error::ModeError;
use crate::proto::{Action, ModeChange, Response};
use crate::state::AccessHierarchy;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeType {
    Channel,
    User,
}

impl ModeType {
    pub fn as_str(self) -> &'static str {
        match self {
            ModeType::Channel => "channel",
            ModeType::User => "user",
        }
    }
}

impl fmt::Display for ModeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameter cardinality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamSpec {
    /// Never takes a parameter (`+n`).
    Never,
    /// Parameter only when setting (`+l 10`, `-l`).
    SetOnly,
    /// Parameter in both directions (`+k key`, `-k key`).
    Always,
}

/// Numerics used to list the entries of a list mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListReplies {
    pub entry: Response,
    pub end: Response,
    pub end_text: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeKind {
    Flag,
    List(ListReplies),
}

/// Everything a check needs to judge one change.
#[derive(Debug, Clone, Copy)]
pub struct ModeCheck<'a> {
    /// Actor's tentative access letters on the channel (empty for user modes).
    pub actor_access: &'a str,
    pub hierarchy: &'a AccessHierarchy,
    pub action: Action,
    pub param: Option<&'a str>,
    /// Current parameter of the mode on the target, if set.
    pub current: Option<&'a str>,
}

pub type AccessCheck = fn(&ModeDefinition, &ModeCheck<'_>) -> Result<bool, ModeError>;
pub type ValidityCheck = fn(&ModeCheck<'_>) -> bool;

#[derive(Debug, Clone)]
pub struct ModeDefinition {
    pub name: String,
    pub letter: char,
    pub mode_type: ModeType,
    pub param_spec: ParamSpec,
    pub kind: ModeKind,
    /// Minimum access level for the default channel access check.
    pub required_level: Option<String>,
    pub access_check: Option<AccessCheck>,
    pub validity_check: Option<ValidityCheck>,
}

impl ModeDefinition {
    fn base(name: &str, letter: char, mode_type: ModeType, param_spec: ParamSpec) -> Self {
        Self {
            name: name.to_string(),
            letter,
            mode_type,
            param_spec,
            kind: ModeKind::Flag,
            required_level: None,
            access_check: None,
            validity_check: None,
        }
    }

    /// Parameterless channel flag settable from `level` upwards.
    pub fn channel_flag(name: &str, letter: char, level: &str) -> Self {
        Self::channel_param(name, letter, ParamSpec::Never, level)
    }

    pub fn channel_param(name: &str, letter: char, param_spec: ParamSpec, level: &str) -> Self {
        let mut def = Self::base(name, letter, ModeType::Channel, param_spec);
        def.required_level = Some(level.to_string());
        def
    }

    pub fn channel_list(name: &str, letter: char, level: &str, replies: ListReplies) -> Self {
        let mut def = Self::channel_param(name, letter, ParamSpec::Always, level);
        def.kind = ModeKind::List(replies);
        def
    }

    pub fn user_flag(name: &str, letter: char) -> Self {
        Self::base(name, letter, ModeType::User, ParamSpec::Never)
    }

    pub fn with_access_check(mut self, check: AccessCheck) -> Self {
        self.access_check = Some(check);
        self
    }

    pub fn with_validity_check(mut self, check: ValidityCheck) -> Self {
        self.validity_check = Some(check);
        self
    }

    #[inline]
    pub fn is_list(&self) -> bool {
        matches!(self.kind, ModeKind::List(_))
    }

    /// Whether a change in this direction consumes a parameter.
    pub fn takes_param(&self, action: Action) -> bool {
        match self.param_spec {
            ParamSpec::Never => false,
            ParamSpec::SetOnly => action.is_add(),
            ParamSpec::Always => true,
        }
    }

    /// Run the access check: the custom one if present, otherwise the
    /// required level against the actor's tentative access.
    pub fn check_access(&self, check: &ModeCheck<'_>) -> Result<bool, ModeError> {
        if let Some(custom) = self.access_check {
            return custom(self, check);
        }
        match &self.required_level {
            Some(level) => check.hierarchy.is_at_least(check.actor_access, level),
            None => Ok(true),
        }
    }

    pub fn check_validity(&self, check: &ModeCheck<'_>) -> bool {
        self.validity_check.is_none_or(|valid| valid(check))
    }
}

/// A mode applied to an entity.
#[derive(Debug, Clone)]
pub struct ModeState {
    pub def: Arc<ModeDefinition>,
    pub param: Option<String>,
}

impl ModeState {
    pub fn new(def: Arc<ModeDefinition>, param: Option<String>) -> Self {
        Self { def, param }
    }

    #[inline]
    pub fn letter(&self) -> char {
        self.def.letter
    }

    /// Deterministic order: letter, then parameter.
    pub fn sort_order(a: &ModeState, b: &ModeState) -> Ordering {
        a.letter()
            .cmp(&b.letter())
            .then_with(|| a.param.cmp(&b.param))
    }
}

/// A change accepted during a MODE batch, with the bookkeeping needed to
/// cancel it against a later opposite change.
#[derive(Debug, Clone)]
pub(crate) struct StagedChange {
    pub change: ModeChange,
    /// Which slot of the letter this touches: target uid for prefix modes,
    /// folded mask for list modes, `None` for single-slot modes.
    pub slot: Option<String>,
    /// Parameter the change added or removed.
    pub identity: Option<String>,
    /// Parameter overwritten by an add on an already-set mode.
    pub replaced: Option<String>,
}

/// Append a staged change, or drop it together with the latest change on
/// the same slot when the two exactly undo each other.
pub(crate) fn stage_change(staged: &mut Vec<StagedChange>, entry: StagedChange) {
    let previous = staged
        .iter()
        .rposition(|s| s.change.letter == entry.change.letter && s.slot == entry.slot);
    if let Some(pos) = previous {
        let prev = &staged[pos];
        if prev.change.action == entry.change.action.opposite()
            && prev.identity == entry.identity
            && prev.replaced.is_none()
            && entry.replaced.is_none()
        {
            staged.remove(pos);
            return;
        }
    }
    staged.push(entry);
}

/// Render applied modes as `+ntk key`.
pub fn modes_to_string(modes: &[ModeState]) -> String {
    let letters: String = modes.iter().map(ModeState::letter).collect();
    let params: Vec<&str> = modes.iter().filter_map(|m| m.param.as_deref()).collect();
    let mut out = format!("+{}", letters);
    for param in params {
        out.push(' ');
        out.push_str(param);
    }
    out
}
