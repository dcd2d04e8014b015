//! The Matrix - central shared state for one server instance.
//!
//! The Matrix owns every table the connection tasks share: users, the nick
//! index, channels, registered modes, hooks, commands and pending invites.
//! Tables are only mutated through the methods here and in `membership.rs`.
//!
//! Lock order is channel, then user. Arcs are always cloned out of a
//! `DashMap` before the entity lock is taken.

use super::modes::ModeRegistry;
use super::registration::Credentials;
use super::user::{NickProblem, User, UserModeSource};
use super::{AccessHierarchy, Channel, InviteStore, Uid, UidGenerator};
use crate::caps::CapabilitySet;
use crate::config::{Config, LimitsConfig, OperBlock};
use crate::error::ModeError;
use crate::handlers::Registry;
use crate::hooks::HookBus;
use crate::modules::ModuleTable;
use crate::proto::{Message, ModeChange, ModeString, Responder, irc_to_lower};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};

/// This server's identity information.
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub name: String,
    pub network: String,
    pub version: String,
    pub description: String,
    pub created: i64,
}

/// Configuration accessible to handlers and modules via Matrix.
#[derive(Debug, Clone)]
pub struct MatrixConfig {
    pub limits: LimitsConfig,
    pub motd: Vec<String>,
    pub opers: Vec<OperBlock>,
    pub resolve_hostnames: bool,
}

pub struct Matrix {
    pub server_info: ServerInfo,
    pub config: MatrixConfig,
    pub hierarchy: AccessHierarchy,
    pub modes: ModeRegistry,
    pub hooks: HookBus,
    pub commands: Registry,
    pub capabilities: CapabilitySet,
    pub invites: InviteStore,
    pub(crate) modules: ModuleTable,
    users: DashMap<Uid, Arc<RwLock<User>>>,
    /// Folded nick to uid.
    nicks: DashMap<String, Uid>,
    /// Folded channel name to channel.
    pub(super) channels: DashMap<String, Arc<RwLock<Channel>>>,
    senders: DashMap<Uid, mpsc::Sender<Message>>,
    uid_gen: UidGenerator,
}

impl Matrix {
    /// Build the server state. Fails only when the access hierarchy is
    /// inconsistent.
    pub fn new(config: &Config) -> Result<Self, ModeError> {
        Ok(Self {
            server_info: ServerInfo {
                name: config.server.name.clone(),
                network: config.server.network.clone(),
                version: config.server.version.clone(),
                description: config.server.description.clone(),
                created: chrono::Utc::now().timestamp(),
            },
            config: MatrixConfig {
                limits: config.limits.clone(),
                motd: config.motd.load_lines(),
                opers: config.oper.clone(),
                resolve_hostnames: config.server.resolve_hostnames,
            },
            hierarchy: AccessHierarchy::standard()?,
            modes: ModeRegistry::new(),
            hooks: HookBus::new(),
            commands: Registry::new(),
            capabilities: CapabilitySet::default(),
            invites: InviteStore::default(),
            modules: ModuleTable::default(),
            users: DashMap::new(),
            nicks: DashMap::new(),
            channels: DashMap::new(),
            senders: DashMap::new(),
            uid_gen: UidGenerator::new(config.server.sid.clone()),
        })
    }

    /// Bare instance with default config, no modules or core commands.
    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Self::new(&Config::for_tests()).expect("test matrix")
    }

    pub fn next_uid(&self) -> Uid {
        self.uid_gen.next()
    }

    #[inline]
    pub fn server_name(&self) -> &str {
        &self.server_info.name
    }

    pub fn now_ms() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    // --- lookups ---

    pub fn user(&self, uid: &str) -> Option<Arc<RwLock<User>>> {
        self.users.get(uid).map(|u| Arc::clone(u.value()))
    }

    /// Clone of the user entity, for hook arguments and replies.
    pub fn user_snapshot(&self, uid: &str) -> Option<User> {
        self.user(uid).map(|u| u.read().clone())
    }

    pub fn find_uid(&self, nick: &str) -> Option<Uid> {
        self.nicks.get(&irc_to_lower(nick)).map(|r| r.value().clone())
    }

    pub fn find_user(&self, nick: &str) -> Option<Arc<RwLock<User>>> {
        let uid = self.find_uid(nick)?;
        self.user(&uid)
    }

    pub fn nick_exists(&self, nick: &str) -> bool {
        self.nicks.contains_key(&irc_to_lower(nick))
    }

    pub fn channel(&self, name: &str) -> Option<Arc<RwLock<Channel>>> {
        self.channels.get(&irc_to_lower(name)).map(|c| Arc::clone(c.value()))
    }

    pub fn all_channels(&self) -> Vec<Arc<RwLock<Channel>>> {
        self.channels.iter().map(|c| Arc::clone(c.value())).collect()
    }

    pub fn all_users(&self) -> Vec<Arc<RwLock<User>>> {
        self.users.iter().map(|u| Arc::clone(u.value())).collect()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Whether a channel is hidden from `viewer` by a visibility hook.
    pub fn is_secret_for(&self, channel: &Channel, viewer: &User) -> bool {
        self.hooks.channel_visibility(self, channel, viewer).secret && !channel.is_member(&viewer.uid)
    }

    // --- routing ---

    /// Attach the outbound queue of a registered connection.
    pub fn attach_sender(&self, uid: &str, sender: mpsc::Sender<Message>) {
        self.senders.insert(uid.to_string(), sender);
    }

    /// Drop the outbound queue. The connection drains what is queued and
    /// then closes.
    pub fn disconnect(&self, uid: &str) {
        self.senders.remove(uid);
    }

    /// Queue a message for a user. A full SendQ disconnects the user.
    pub fn send_to(&self, uid: &str, msg: Message) {
        let result = match self.senders.get(uid) {
            Some(sender) => sender.try_send(msg),
            None => return,
        };
        match result {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!(%uid, "SendQ exceeded");
                self.disconnect(uid);
            }
            Err(TrySendError::Closed(_)) => {
                self.senders.remove(uid);
            }
        }
    }

    /// Send to every member of a channel except `except`.
    pub fn broadcast_to_channel(&self, channel: &Channel, msg: &Message, except: Option<&str>) {
        for uid in channel.member_uids() {
            if Some(uid.as_str()) != except {
                self.send_to(uid, msg.clone());
            }
        }
    }

    /// Uids sharing at least one channel with `uid`, excluding `uid`.
    pub fn common_channel_peers(&self, uid: &str) -> HashSet<Uid> {
        let Some(user) = self.user(uid) else {
            return HashSet::new();
        };
        let channels: Vec<String> = user.read().channels.iter().cloned().collect();
        let mut peers = HashSet::new();
        for name in channels {
            if let Some(channel) = self.channel(&name) {
                peers.extend(channel.read().member_uids().filter(|m| m.as_str() != uid).cloned());
            }
        }
        peers
    }

    /// Deliver once to every peer sharing a channel with `uid`.
    pub fn broadcast_to_peers(&self, uid: &str, msg: &Message) {
        for peer in self.common_channel_peers(uid) {
            self.send_to(&peer, msg.clone());
        }
    }

    // --- registration and nicks ---

    /// Complete registration: claim the nick atomically and create the user.
    ///
    /// Modes collected from `UserCreate` hooks are applied as an internal grant.
    pub fn register_user(
        &self,
        uid: &str,
        creds: &Credentials,
        caps: &HashSet<String>,
        out: &mut Responder,
    ) -> Result<(), NickProblem> {
        match self.nicks.entry(irc_to_lower(&creds.nick)) {
            Entry::Occupied(_) => return Err(NickProblem::InUse),
            Entry::Vacant(slot) => {
                slot.insert(uid.to_string());
            }
        }

        let mut user = User::new(
            uid.to_string(),
            creds.nick.clone(),
            creds.user.clone(),
            creds.realname.clone(),
            creds.host.clone(),
        );
        user.caps = caps.clone();

        let mut initial = Vec::new();
        self.hooks.user_create(self, &user, &mut initial);
        if !initial.is_empty()
            && let Err(e) =
                user.process_modes(&initial, UserModeSource::Internal, &self.modes, &self.hierarchy, out)
        {
            warn!(%uid, error = %e, "Initial user modes rejected");
        }

        self.users.insert(uid.to_string(), Arc::new(RwLock::new(user)));
        info!(%uid, nick = %creds.nick, host = %creds.host, "User registered");
        Ok(())
    }

    /// Rename a registered user and announce it once to every observer.
    ///
    /// `new_nick` must already be validated. A case-only change of the
    /// user's own nick never collides.
    pub fn change_nick(&self, uid: &str, new_nick: &str, out: &mut Responder) -> Result<(), NickProblem> {
        let Some(user) = self.user(uid) else {
            return Ok(());
        };
        let (old_nick, old_prefix) = {
            let u = user.read();
            (u.nick.clone(), u.prefix())
        };
        if old_nick == new_nick {
            return Ok(());
        }

        let old_folded = irc_to_lower(&old_nick);
        let new_folded = irc_to_lower(new_nick);
        if old_folded != new_folded {
            match self.nicks.entry(new_folded) {
                Entry::Occupied(_) => return Err(NickProblem::InUse),
                Entry::Vacant(slot) => {
                    slot.insert(uid.to_string());
                }
            }
            self.nicks.remove_if(&old_folded, |_, owner| owner == uid);
        }
        user.write().nick = new_nick.to_string();

        let msg = Message::new("NICK", [new_nick]).with_prefix(old_prefix);
        self.broadcast_to_peers(uid, &msg);
        out.send(msg);
        out.set_me(new_nick);
        debug!(%uid, old = %old_nick, new = %new_nick, "Nick changed");
        Ok(())
    }

    // --- user modes ---

    /// Apply user-mode changes to `uid` and acknowledge them to the actor.
    pub fn apply_user_modes(
        &self,
        uid: &str,
        changes: &[ModeChange],
        source: UserModeSource,
        out: &mut Responder,
    ) -> Result<Vec<ModeChange>, ModeError> {
        let Some(user) = self.user(uid) else {
            return Ok(Vec::new());
        };
        let mut user = user.write();
        let applied = user.process_modes(changes, source, &self.modes, &self.hierarchy, out)?;
        if !applied.is_empty() {
            let rendered = ModeString::render(applied.iter());
            let mut params = vec![user.nick.clone()];
            params.extend(rendered.into_params());
            out.send(Message::new("MODE", params).with_prefix(user.prefix()));
        }
        Ok(applied)
    }

    /// Letters of the registered user modes, for 004.
    pub fn user_mode_letters(&self) -> String {
        self.modes.user_mode_letters()
    }

    /// Letters of all channel modes including prefix modes, for 004.
    pub fn channel_mode_letters(&self) -> String {
        let mut letters: Vec<char> = self.modes.channel_mode_letters().chars().collect();
        letters.extend(self.hierarchy.levels().iter().map(|l| l.mode_char));
        letters.sort_unstable();
        letters.into_iter().collect()
    }

    // --- teardown ---

    /// Tear down a connection's user. Idempotent: only the first call for a
    /// uid does anything and returns true.
    ///
    /// Unlinks the user from every channel (destroying emptied ones), sends
    /// one QUIT to each co-member and frees the nick.
    pub fn destroy_connection(&self, uid: &str, reason: &str) -> bool {
        let Some((_, user)) = self.users.remove(uid) else {
            self.senders.remove(uid);
            return false;
        };

        let (nick, prefix, channels) = {
            let u = user.read();
            (u.nick.clone(), u.prefix(), u.channels.iter().cloned().collect::<Vec<_>>())
        };

        let quit = Message::new("QUIT", [reason]).with_prefix(prefix);
        let mut notified: HashSet<Uid> = HashSet::new();
        for name in channels {
            let Some(channel) = self.channel(&name) else {
                continue;
            };
            let mut ch = channel.write();
            for member in ch.member_uids() {
                if member != uid && notified.insert(member.clone()) {
                    self.send_to(member, quit.clone());
                }
            }
            self.unlink(&channel, &mut ch, &mut user.write());
        }

        self.nicks.remove_if(&irc_to_lower(&nick), |_, owner| owner == uid);
        self.senders.remove(uid);

        let snapshot = user.read().clone();
        self.hooks.user_destroy(self, &snapshot);
        info!(%uid, %nick, %reason, "User destroyed");
        true
    }
}
