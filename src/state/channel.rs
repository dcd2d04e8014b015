//! Channel entity and the channel mode-diff engine.

use super::modes::{
    ListModeStore, ListSession, ModeCheck, ModeDefinition, ModeKind, ModeRegistry, ModeState,
    ModeType, StagedChange, modes_to_string, stage_change,
};
use super::{AccessHierarchy, Uid};
use crate::error::{ChannelError, ModeError};
use crate::proto::{Action, ModeChange, Responder, Response, irc_to_lower};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Channel topic with metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    pub text: String,
    pub set_by: String,
    pub set_at: i64,
}

/// A user a mode parameter resolved to.
#[derive(Debug, Clone)]
pub struct ModeTarget {
    pub uid: Uid,
    pub nick: String,
    pub registered: bool,
}

/// Who is changing modes.
#[derive(Debug, Clone, Copy)]
pub enum ModeSource<'a> {
    User { uid: &'a str, nick: &'a str },
    /// Internal grants (founder access, hook-driven changes). Skips access checks.
    Server,
}

/// Server tables a mode batch is evaluated against.
pub struct ModeEnv<'a> {
    pub registry: &'a ModeRegistry,
    pub hierarchy: &'a AccessHierarchy,
    pub lookup: &'a dyn Fn(&str) -> Option<ModeTarget>,
    pub server_name: &'a str,
    pub now_ms: i64,
}

#[derive(Debug, Clone)]
pub struct Channel {
    pub name: String,
    pub created_at: i64,
    pub topic: Option<Topic>,
    modes: Vec<ModeState>,
    /// Member uid to access letters, highest rank first.
    members: BTreeMap<Uid, String>,
    lists: ListModeStore,
}

impl Channel {
    pub fn new(name: &str, created_at: i64) -> Self {
        Self {
            name: name.to_string(),
            created_at,
            topic: None,
            modes: Vec::new(),
            members: BTreeMap::new(),
            lists: ListModeStore::default(),
        }
    }

    pub fn folded_name(&self) -> String {
        irc_to_lower(&self.name)
    }

    // --- membership (mutated only through Matrix::link / Matrix::unlink) ---

    pub(crate) fn add_member(&mut self, uid: &str, access: String) -> bool {
        if self.members.contains_key(uid) {
            return false;
        }
        self.members.insert(uid.to_string(), access);
        true
    }

    pub(crate) fn remove_member(&mut self, uid: &str) -> bool {
        self.members.remove(uid).is_some()
    }

    pub fn is_member(&self, uid: &str) -> bool {
        self.members.contains_key(uid)
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn member_uids(&self) -> impl Iterator<Item = &Uid> {
        self.members.keys()
    }

    pub fn members(&self) -> impl Iterator<Item = (&Uid, &str)> {
        self.members.iter().map(|(uid, access)| (uid, access.as_str()))
    }

    pub fn access_of(&self, uid: &str) -> Option<&str> {
        self.members.get(uid).map(String::as_str)
    }

    /// Whether a member's access reaches `level`. Non-members never do.
    pub fn is_user_at_least(
        &self,
        hierarchy: &AccessHierarchy,
        uid: &str,
        level: &str,
    ) -> Result<bool, ModeError> {
        hierarchy.is_at_least(self.access_of(uid).unwrap_or(""), level)
    }

    // --- modes ---

    pub fn has_mode(&self, letter: char) -> bool {
        self.modes.iter().any(|m| m.letter() == letter)
    }

    pub fn has_mode_named(&self, name: &str) -> bool {
        self.modes.iter().any(|m| m.def.name == name)
    }

    pub fn mode_param(&self, letter: char) -> Option<&str> {
        self.modes
            .iter()
            .find(|m| m.letter() == letter)
            .and_then(|m| m.param.as_deref())
    }

    pub fn modes(&self) -> &[ModeState] {
        &self.modes
    }

    pub fn modes_as_string(&self) -> String {
        modes_to_string(&self.modes)
    }

    pub fn lists(&self) -> &ListModeStore {
        &self.lists
    }

    /// Send the entries of a list mode followed by its end numeric.
    pub fn send_list(&self, def: &ModeDefinition, out: &mut Responder) {
        let ModeKind::List(replies) = def.kind else {
            return;
        };
        for entry in self.lists.entries(def.letter) {
            let ts = (entry.timestamp_ms / 1000).to_string();
            out.numeric(
                replies.entry,
                &[&self.name, &entry.value, &entry.creator, &ts],
            );
        }
        out.numeric(replies.end, &[&self.name, replies.end_text]);
    }

    /// Diff a requested batch against the current state and commit it.
    ///
    /// All tentative work happens on copies of the mode list and access
    /// map; list-mode changes are collected in sessions finalized once at
    /// the end. Rejected entries produce numerics on `out` and are skipped
    /// without aborting the batch. Returns the changes actually applied, in
    /// acceptance order; an empty result means nothing was touched.
    pub fn process_modes(
        &mut self,
        changes: &[ModeChange],
        source: ModeSource<'_>,
        env: &ModeEnv<'_>,
        out: &mut Responder,
    ) -> Result<Vec<ModeChange>, ModeError> {
        let mut resulting_modes = self.modes.clone();
        let mut resulting_access = self.members.clone();
        let mut sessions: Vec<ListSession> = Vec::new();
        let mut staged: Vec<StagedChange> = Vec::new();

        let creator = match source {
            ModeSource::User { nick, .. } => nick,
            ModeSource::Server => env.server_name,
        };

        for change in changes {
            let actor_access = match source {
                ModeSource::User { uid, .. } => resulting_access
                    .get(uid)
                    .cloned()
                    .unwrap_or_default(),
                ModeSource::Server => String::new(),
            };
            let bypass = matches!(source, ModeSource::Server);

            // Prefix (rank) modes
            if let Some(level) = env.hierarchy.by_char(change.letter) {
                let Some(param) = change.param.as_deref() else {
                    continue;
                };
                let target = match (env.lookup)(param) {
                    Some(target) if target.registered => target,
                    _ => {
                        out.numeric(Response::ERR_NOSUCHNICK, &[param, "No such nick/channel"]);
                        continue;
                    }
                };
                let Some(has) = resulting_access
                    .get(&target.uid)
                    .map(|access| access.contains(change.letter))
                else {
                    ChannelError::UserNotInChannel(target.nick).emit(out, &self.name);
                    continue;
                };
                if !bypass && !env.hierarchy.is_at_least(&actor_access, &level.min_level_to_set)? {
                    ChannelError::ChanOpPrivsNeeded.emit(out, &self.name);
                    continue;
                }
                if has == change.action.is_add() {
                    continue;
                }
                if let Some(access) = resulting_access.get_mut(&target.uid) {
                    match change.action {
                        Action::Add => access.push(change.letter),
                        Action::Remove => access.retain(|c| c != change.letter),
                    }
                }
                stage_change(
                    &mut staged,
                    StagedChange {
                        change: ModeChange {
                            letter: change.letter,
                            action: change.action,
                            param: Some(target.nick),
                        },
                        slot: Some(target.uid.clone()),
                        identity: Some(target.uid),
                        replaced: None,
                    },
                );
                continue;
            }

            let Some(def) = env.registry.find_by_letter(change.letter, ModeType::Channel) else {
                let letter = change.letter.to_string();
                out.numeric(
                    Response::ERR_UNKNOWNMODE,
                    &[&letter, &format!("is unknown mode char to me for {}", self.name)],
                );
                continue;
            };

            // List modes
            if def.is_list() {
                let Some(mask) = change.param.as_deref() else {
                    self.send_list(&def, out);
                    continue;
                };
                let check = ModeCheck {
                    actor_access: &actor_access,
                    hierarchy: env.hierarchy,
                    action: change.action,
                    param: Some(mask),
                    current: None,
                };
                if !bypass && !def.check_access(&check)? {
                    ChannelError::ChanOpPrivsNeeded.emit(out, &self.name);
                    continue;
                }
                if !def.check_validity(&check) {
                    continue;
                }
                let idx = match sessions.iter().position(|s| s.letter() == def.letter) {
                    Some(idx) => idx,
                    None => {
                        sessions.push(self.lists.session(def.letter, creator));
                        sessions.len() - 1
                    }
                };
                let effective = match change.action {
                    Action::Add => sessions[idx].add(&self.lists, mask),
                    Action::Remove => sessions[idx].remove(&self.lists, mask),
                };
                if !effective {
                    continue;
                }
                let folded = irc_to_lower(mask);
                stage_change(
                    &mut staged,
                    StagedChange {
                        change: ModeChange {
                            letter: def.letter,
                            action: change.action,
                            param: Some(mask.to_string()),
                        },
                        slot: Some(folded.clone()),
                        identity: Some(folded),
                        replaced: None,
                    },
                );
                continue;
            }

            // Scalar modes
            let takes_param = def.takes_param(change.action);
            if takes_param && change.param.is_none() {
                continue;
            }
            let param = if takes_param { change.param.clone() } else { None };
            let slot = resulting_modes.iter().position(|m| m.letter() == def.letter);
            let current = slot.and_then(|i| resulting_modes[i].param.clone());
            let check = ModeCheck {
                actor_access: &actor_access,
                hierarchy: env.hierarchy,
                action: change.action,
                param: param.as_deref(),
                current: current.as_deref(),
            };
            if !bypass && !def.check_access(&check)? {
                ChannelError::ChanOpPrivsNeeded.emit(out, &self.name);
                continue;
            }
            if !def.check_validity(&check) {
                continue;
            }

            match (change.action, slot) {
                (Action::Add, Some(i)) => {
                    if resulting_modes[i].param == param {
                        continue;
                    }
                    let replaced = resulting_modes[i].param.take();
                    resulting_modes[i] = ModeState::new(Arc::clone(&def), param.clone());
                    stage_change(
                        &mut staged,
                        StagedChange {
                            change: ModeChange {
                                letter: def.letter,
                                action: Action::Add,
                                param: param.clone(),
                            },
                            slot: None,
                            identity: param,
                            replaced,
                        },
                    );
                }
                (Action::Add, None) => {
                    resulting_modes.push(ModeState::new(Arc::clone(&def), param.clone()));
                    stage_change(
                        &mut staged,
                        StagedChange {
                            change: ModeChange {
                                letter: def.letter,
                                action: Action::Add,
                                param: param.clone(),
                            },
                            slot: None,
                            identity: param,
                            replaced: None,
                        },
                    );
                }
                (Action::Remove, Some(i)) => {
                    let removed = resulting_modes.remove(i).param;
                    stage_change(
                        &mut staged,
                        StagedChange {
                            change: ModeChange {
                                letter: def.letter,
                                action: Action::Remove,
                                param,
                            },
                            slot: None,
                            identity: removed,
                            replaced: None,
                        },
                    );
                }
                (Action::Remove, None) => continue,
            }
        }

        if staged.is_empty() {
            return Ok(Vec::new());
        }

        resulting_modes.sort_by(ModeState::sort_order);
        for access in resulting_access.values_mut() {
            *access = env.hierarchy.normalize(access);
        }
        self.modes = resulting_modes;
        self.members = resulting_access;
        for session in sessions {
            session.finalize(&mut self.lists, env.now_ms);
        }

        Ok(staged.into_iter().map(|s| s.change).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::Response;
    use crate::state::modes::{ListReplies, ParamSpec};
    use std::collections::HashMap;

    const BANS: ListReplies = ListReplies {
        entry: Response::RPL_BANLIST,
        end: Response::RPL_ENDOFBANLIST,
        end_text: "End of channel ban list",
    };

    struct Fixture {
        registry: ModeRegistry,
        hierarchy: AccessHierarchy,
        users: HashMap<String, ModeTarget>,
    }

    impl Fixture {
        fn new() -> Self {
            let registry = ModeRegistry::new();
            registry
                .register(ModeDefinition::channel_flag("noExternal", 'n', "op"))
                .expect("n");
            registry
                .register(ModeDefinition::channel_flag("moderated", 'm', "halfop"))
                .expect("m");
            registry
                .register(
                    ModeDefinition::channel_param("key", 'k', ParamSpec::Always, "op")
                        .with_validity_check(|c| {
                            c.action.is_add() || c.current.is_some_and(|cur| Some(cur) == c.param)
                        }),
                )
                .expect("k");
            registry
                .register(
                    ModeDefinition::channel_param("limit", 'l', ParamSpec::SetOnly, "op")
                        .with_validity_check(|c| {
                            !c.action.is_add()
                                || c.param.and_then(|p| p.parse::<u32>().ok()).is_some_and(|n| n > 0)
                        }),
                )
                .expect("l");
            registry
                .register(ModeDefinition::channel_list("ban", 'b', "halfop", BANS))
                .expect("b");
            let mut users = HashMap::new();
            for (uid, nick) in [("1", "alice"), ("2", "bob"), ("3", "carol")] {
                users.insert(
                    nick.to_string(),
                    ModeTarget {
                        uid: uid.to_string(),
                        nick: nick.to_string(),
                        registered: true,
                    },
                );
            }
            Self {
                registry,
                hierarchy: AccessHierarchy::standard().expect("standard hierarchy"),
                users,
            }
        }

        fn run(
            &self,
            channel: &mut Channel,
            actor: (&str, &str),
            changes: &[ModeChange],
        ) -> (Vec<ModeChange>, Vec<String>) {
            let lookup = |nick: &str| self.users.get(nick).cloned();
            let env = ModeEnv {
                registry: &self.registry,
                hierarchy: &self.hierarchy,
                lookup: &lookup,
                server_name: "irc.test",
                now_ms: 1_000,
            };
            let mut out = Responder::new("irc.test", actor.1);
            let applied = channel
                .process_modes(
                    changes,
                    ModeSource::User {
                        uid: actor.0,
                        nick: actor.1,
                    },
                    &env,
                    &mut out,
                )
                .expect("process");
            let numerics = out.drain().into_iter().map(|m| m.command).collect();
            (applied, numerics)
        }
    }

    fn channel_with(members: &[(&str, &str)]) -> Channel {
        let mut channel = Channel::new("#test", 0);
        for (uid, access) in members {
            channel.add_member(uid, access.to_string());
        }
        channel
    }

    const ALICE: (&str, &str) = ("1", "alice");
    const BOB: (&str, &str) = ("2", "bob");

    #[test]
    fn test_noop_batch_has_no_effect() {
        let fx = Fixture::new();
        let mut channel = channel_with(&[("1", "o"), ("2", "")]);
        let (applied, numerics) = fx.run(
            &mut channel,
            ALICE,
            &[
                ModeChange::add('o', Some("bob")),
                ModeChange::remove('o', Some("bob")),
            ],
        );
        assert!(applied.is_empty());
        assert!(numerics.is_empty());
        assert_eq!(channel.access_of("2"), Some(""));
        assert_eq!(channel.modes_as_string(), "+");
    }

    #[test]
    fn test_adding_set_flag_is_dropped() {
        let fx = Fixture::new();
        let mut channel = channel_with(&[("1", "o")]);
        let (applied, _) = fx.run(&mut channel, ALICE, &[ModeChange::add('n', None)]);
        assert_eq!(applied.len(), 1);
        let (applied, _) = fx.run(&mut channel, ALICE, &[ModeChange::add('n', None)]);
        assert!(applied.is_empty());
        let (applied, _) = fx.run(&mut channel, ALICE, &[ModeChange::remove('m', None)]);
        assert!(applied.is_empty());
    }

    #[test]
    fn test_prefix_and_scalar_share_one_result() {
        let fx = Fixture::new();
        let mut channel = channel_with(&[("1", "o"), ("2", "")]);
        let (applied, _) = fx.run(
            &mut channel,
            ALICE,
            &[ModeChange::add('v', Some("bob")), ModeChange::add('m', None)],
        );
        assert_eq!(
            applied,
            vec![ModeChange::add('v', Some("bob")), ModeChange::add('m', None)]
        );
        assert_eq!(channel.access_of("2"), Some("v"));
        assert!(channel.has_mode('m'));
    }

    #[test]
    fn test_grant_chain_composes_within_batch() {
        let fx = Fixture::new();
        let mut channel = channel_with(&[("1", "o"), ("2", ""), ("3", "")]);
        let (applied, _) = fx.run(
            &mut channel,
            ALICE,
            &[
                ModeChange::add('o', Some("bob")),
                ModeChange::add('v', Some("carol")),
            ],
        );
        assert_eq!(applied.len(), 2);
        assert_eq!(channel.access_of("2"), Some("o"));
        assert_eq!(channel.access_of("3"), Some("v"));
    }

    #[test]
    fn test_self_demotion_removes_authority_mid_batch() {
        let fx = Fixture::new();
        let mut channel = channel_with(&[("1", "o"), ("2", "")]);
        let (applied, numerics) = fx.run(
            &mut channel,
            ALICE,
            &[
                ModeChange::remove('o', Some("alice")),
                ModeChange::add('m', None),
            ],
        );
        assert_eq!(applied, vec![ModeChange::remove('o', Some("alice"))]);
        assert_eq!(numerics, vec!["482"]);
        assert!(!channel.has_mode('m'));
    }

    #[test]
    fn test_permission_denied_keeps_rest_of_batch() {
        let fx = Fixture::new();
        let mut channel = channel_with(&[("1", "h"), ("2", "")]);
        let (applied, numerics) = fx.run(
            &mut channel,
            ALICE,
            &[
                ModeChange::add('o', Some("bob")),
                ModeChange::add('m', None),
                ModeChange::add('v', Some("bob")),
            ],
        );
        assert_eq!(numerics, vec!["482"]);
        assert_eq!(
            applied,
            vec![ModeChange::add('m', None), ModeChange::add('v', Some("bob"))]
        );
    }

    #[test]
    fn test_unknown_letter_and_target_reported() {
        let fx = Fixture::new();
        let mut channel = channel_with(&[("1", "o")]);
        let (applied, numerics) = fx.run(
            &mut channel,
            ALICE,
            &[
                ModeChange::add('Z', None),
                ModeChange::add('o', Some("nobody")),
                ModeChange::add('o', Some("bob")),
                ModeChange::add('n', None),
            ],
        );
        assert_eq!(numerics, vec!["472", "401", "441"]);
        assert_eq!(applied, vec![ModeChange::add('n', None)]);
    }

    #[test]
    fn test_key_removal_requires_matching_key() {
        let fx = Fixture::new();
        let mut channel = channel_with(&[("1", "o")]);
        fx.run(&mut channel, ALICE, &[ModeChange::add('k', Some("secret"))]);
        assert_eq!(channel.mode_param('k'), Some("secret"));

        let (applied, numerics) = fx.run(&mut channel, ALICE, &[ModeChange::remove('k', Some("wrong"))]);
        assert!(applied.is_empty());
        assert!(numerics.is_empty());

        let (applied, _) = fx.run(&mut channel, ALICE, &[ModeChange::remove('k', Some("secret"))]);
        assert_eq!(applied, vec![ModeChange::remove('k', Some("secret"))]);
        assert!(!channel.has_mode('k'));
    }

    #[test]
    fn test_limit_validity_silently_rejects() {
        let fx = Fixture::new();
        let mut channel = channel_with(&[("1", "o")]);
        let (applied, numerics) = fx.run(&mut channel, ALICE, &[ModeChange::add('l', Some("0"))]);
        assert!(applied.is_empty() && numerics.is_empty());
        let (applied, _) = fx.run(&mut channel, ALICE, &[ModeChange::add('l', Some("10"))]);
        assert_eq!(applied.len(), 1);
        assert_eq!(channel.mode_param('l'), Some("10"));
    }

    #[test]
    fn test_replacing_limit_then_removing_is_not_cancelled() {
        let fx = Fixture::new();
        let mut channel = channel_with(&[("1", "o")]);
        fx.run(&mut channel, ALICE, &[ModeChange::add('l', Some("10"))]);
        let (applied, _) = fx.run(
            &mut channel,
            ALICE,
            &[ModeChange::add('l', Some("5")), ModeChange::remove('l', None)],
        );
        assert_eq!(applied.len(), 2);
        assert!(!channel.has_mode('l'));
    }

    #[test]
    fn test_duplicate_ban_is_noop() {
        let fx = Fixture::new();
        let mut channel = channel_with(&[("1", "o"), ("2", "")]);
        let (applied, _) = fx.run(&mut channel, ALICE, &[ModeChange::add('b', Some("bob!*@*"))]);
        assert_eq!(applied.len(), 1);
        let entries = channel.lists().entries('b');
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].creator, "alice");
        assert_eq!(entries[0].timestamp_ms, 1_000);

        let (applied, _) = fx.run(&mut channel, ALICE, &[ModeChange::add('b', Some("bob!*@*"))]);
        assert!(applied.is_empty());
        assert_eq!(channel.lists().entries('b').len(), 1);
    }

    #[test]
    fn test_ban_toggle_in_one_batch_leaves_list_untouched() {
        let fx = Fixture::new();
        let mut channel = channel_with(&[("1", "o")]);
        let (applied, _) = fx.run(
            &mut channel,
            ALICE,
            &[
                ModeChange::add('b', Some("x!*@*")),
                ModeChange::remove('b', Some("x!*@*")),
            ],
        );
        assert!(applied.is_empty());
        assert!(channel.lists().entries('b').is_empty());
    }

    #[test]
    fn test_list_access_uses_tentative_grants() {
        let fx = Fixture::new();
        let mut channel = channel_with(&[("1", "o"), ("2", "")]);
        let (applied, numerics) = fx.run(&mut channel, BOB, &[ModeChange::add('b', Some("x!*@*"))]);
        assert!(applied.is_empty());
        assert_eq!(numerics, vec!["482"]);

        // Dropping op earlier in the batch takes effect for the ban check.
        let (applied, numerics) = fx.run(
            &mut channel,
            ALICE,
            &[
                ModeChange::remove('o', Some("alice")),
                ModeChange::add('b', Some("x!*@*")),
            ],
        );
        assert_eq!(applied, vec![ModeChange::remove('o', Some("alice"))]);
        assert_eq!(numerics, vec!["482"]);
        assert!(channel.lists().entries('b').is_empty());
    }

    #[test]
    fn test_list_query_without_param() {
        let fx = Fixture::new();
        let mut channel = channel_with(&[("1", "o")]);
        fx.run(&mut channel, ALICE, &[ModeChange::add('b', Some("x!*@*"))]);
        let (applied, numerics) = fx.run(&mut channel, BOB, &[ModeChange::add('b', None)]);
        assert!(applied.is_empty());
        assert_eq!(numerics, vec!["367", "368"]);
    }

    #[test]
    fn test_modes_sorted_after_commit() {
        let fx = Fixture::new();
        let mut channel = channel_with(&[("1", "o")]);
        fx.run(
            &mut channel,
            ALICE,
            &[
                ModeChange::add('n', None),
                ModeChange::add('k', Some("key")),
                ModeChange::add('m', None),
            ],
        );
        assert_eq!(channel.modes_as_string(), "+kmn key");
    }

    #[test]
    fn test_access_strings_normalized() {
        let fx = Fixture::new();
        let mut channel = channel_with(&[("1", "o"), ("2", "v")]);
        fx.run(&mut channel, ALICE, &[ModeChange::add('o', Some("bob"))]);
        assert_eq!(channel.access_of("2"), Some("ov"));
    }

    #[test]
    fn test_cancellation_composition() {
        // Folding a sequence of toggles leaves only the net change.
        let fx = Fixture::new();
        let mut channel = channel_with(&[("1", "o"), ("2", "")]);
        let (applied, _) = fx.run(
            &mut channel,
            ALICE,
            &[
                ModeChange::add('v', Some("bob")),
                ModeChange::remove('v', Some("bob")),
                ModeChange::add('v', Some("bob")),
                ModeChange::add('n', None),
                ModeChange::remove('n', None),
            ],
        );
        assert_eq!(applied, vec![ModeChange::add('v', Some("bob"))]);
        assert_eq!(channel.access_of("2"), Some("v"));
        assert!(!channel.has_mode('n'));
    }
}
