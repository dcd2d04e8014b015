//! Channel membership and channel-level actions on the Matrix.
//!
//! `link` and `unlink` are the only places the channel member map and the
//! user's channel set change, and they always change together. A channel is
//! removed from the table inside the same critical section that empties it.

use super::channel::{ModeEnv, ModeSource, ModeTarget, Topic};
use super::{Channel, Matrix, User};
use crate::error::{ChannelError, HandlerError};
use crate::hooks::{JoinAttempt, MessageKind};
use crate::proto::{Message, ModeChange, ModeString, Responder, Response, Tag, irc_to_lower};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, warn};

/// Longest NAMES line payload before a new 353 is started.
const NAMES_LINE_BUDGET: usize = 400;

fn channel_error(channel: &str, error: ChannelError) -> HandlerError {
    HandlerError::Channel {
        channel: channel.to_string(),
        error,
    }
}

impl Matrix {
    fn link(&self, channel: &mut Channel, user: &mut User, access: String) {
        channel.add_member(&user.uid, access);
        user.channels.insert(channel.folded_name());
    }

    /// Remove the pairing on both sides; destroys the channel when it empties.
    pub(super) fn unlink(&self, handle: &Arc<RwLock<Channel>>, channel: &mut Channel, user: &mut User) {
        channel.remove_member(&user.uid);
        let folded = channel.folded_name();
        user.channels.remove(&folded);
        if channel.is_empty() {
            self.channels.remove_if(&folded, |_, c| Arc::ptr_eq(c, handle));
            let purged = self.invites.purge_channel(&folded);
            debug!(channel = %channel.name, purged, "Channel destroyed");
        }
    }

    fn mode_target(&self, nick: &str) -> Option<ModeTarget> {
        let uid = self.find_uid(nick)?;
        let user = self.user(&uid)?;
        let nick = user.read().nick.clone();
        Some(ModeTarget {
            uid,
            nick,
            registered: true,
        })
    }

    /// Join `uid` to `name`, creating the channel if needed.
    ///
    /// Creation can be vetoed by `ChannelCreate` hooks and any join by
    /// `ChannelJoin` hooks; vetoes answer through `out` and return `Ok`.
    pub fn join_channel(
        &self,
        uid: &str,
        name: &str,
        key: Option<&str>,
        out: &mut Responder,
    ) -> Result<(), HandlerError> {
        let folded = irc_to_lower(name);
        let Some(user) = self.user(uid) else {
            return Ok(());
        };
        let snapshot = user.read().clone();
        if snapshot.channels.contains(&folded) {
            return Ok(());
        }
        if snapshot.channel_count() >= self.config.limits.max_channels {
            return Err(channel_error(name, ChannelError::TooManyChannels));
        }

        loop {
            if let Some(handle) = self.channel(name) {
                let mut channel = handle.write();
                if channel.is_empty() {
                    // Emptied and dropped from the table after we looked it up.
                    continue;
                }
                let attempt = JoinAttempt {
                    channel: &channel,
                    user: &snapshot,
                    key,
                    creating: false,
                };
                if self.hooks.channel_join(self, &attempt, out).is_deny() {
                    return Ok(());
                }
                self.link(&mut channel, &mut user.write(), String::new());
                self.invites.take(uid, &folded);
                self.announce_join(&channel, &snapshot, out);
                return Ok(());
            }

            if self.hooks.channel_create(self, name, &snapshot, out).is_deny() {
                return Ok(());
            }
            let handle = Arc::new(RwLock::new(Channel::new(name, chrono::Utc::now().timestamp())));
            let mut channel = handle.write();

            let mut initial = Vec::new();
            self.hooks.after_channel_create(self, &channel, &snapshot, &mut initial);
            if !initial.is_empty() {
                self.apply_server_modes(&mut channel, &initial);
            }

            let attempt = JoinAttempt {
                channel: &channel,
                user: &snapshot,
                key,
                creating: true,
            };
            if self.hooks.channel_join(self, &attempt, out).is_deny() {
                return Ok(());
            }

            match self.channels.entry(folded.clone()) {
                dashmap::mapref::entry::Entry::Occupied(_) => continue,
                dashmap::mapref::entry::Entry::Vacant(slot) => {
                    slot.insert(Arc::clone(&handle));
                }
            }
            let founder = self
                .hierarchy
                .by_name("op")
                .map(|level| level.mode_char.to_string())
                .unwrap_or_default();
            self.link(&mut channel, &mut user.write(), founder);
            self.invites.take(uid, &folded);
            debug!(channel = %name, %uid, "Channel created");
            self.announce_join(&channel, &snapshot, out);
            return Ok(());
        }
    }

    fn apply_server_modes(&self, channel: &mut Channel, changes: &[ModeChange]) {
        let lookup = |nick: &str| self.mode_target(nick);
        let env = ModeEnv {
            registry: &self.modes,
            hierarchy: &self.hierarchy,
            lookup: &lookup,
            server_name: self.server_name(),
            now_ms: Matrix::now_ms(),
        };
        let mut scratch = Responder::new(self.server_name(), "*");
        if let Err(e) = channel.process_modes(changes, ModeSource::Server, &env, &mut scratch) {
            warn!(channel = %channel.name, error = %e, "Initial channel modes rejected");
        }
    }

    fn announce_join(&self, channel: &Channel, user: &User, out: &mut Responder) {
        let join = Message::new("JOIN", [channel.name.as_str()]).with_prefix(user.prefix());
        self.broadcast_to_channel(channel, &join, Some(&user.uid));
        out.send(join);
        if let Some(topic) = &channel.topic {
            self.topic_reply(channel, topic, out);
        }
        self.names_reply(channel, user, out);
    }

    pub fn topic_reply(&self, channel: &Channel, topic: &Topic, out: &mut Responder) {
        out.numeric(Response::RPL_TOPIC, &[&channel.name, &topic.text]);
        let set_at = topic.set_at.to_string();
        out.numeric(Response::RPL_TOPICWHOTIME, &[&channel.name, &topic.set_by, &set_at]);
    }

    /// 353 lines for a channel followed by 366.
    pub fn names_reply(&self, channel: &Channel, viewer: &User, out: &mut Responder) {
        let viewer_is_member = channel.is_member(&viewer.uid);
        let symbol = if self.hooks.channel_visibility(self, channel, viewer).secret {
            "@"
        } else {
            "="
        };
        let multi_prefix = viewer.has_cap("multi-prefix");

        let mut entries = Vec::with_capacity(channel.member_count());
        for (uid, access) in channel.members() {
            let Some(member) = self.user(uid) else {
                continue;
            };
            let member = member.read();
            if !viewer_is_member && member.has_mode_named("invisible") {
                continue;
            }
            let prefix = if multi_prefix {
                self.hierarchy.all_prefix_glyphs(access)
            } else {
                self.hierarchy.prefix_glyph(access).map(String::from).unwrap_or_default()
            };
            entries.push(format!("{}{}", prefix, member.nick));
        }

        let mut line = String::new();
        for entry in entries {
            if !line.is_empty() && line.len() + entry.len() + 1 > NAMES_LINE_BUDGET {
                out.numeric(Response::RPL_NAMREPLY, &[symbol, &channel.name, &line]);
                line.clear();
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(&entry);
        }
        if !line.is_empty() {
            out.numeric(Response::RPL_NAMREPLY, &[symbol, &channel.name, &line]);
        }
        out.numeric(Response::RPL_ENDOFNAMES, &[&channel.name, "End of /NAMES list"]);
    }

    pub fn part_channel(
        &self,
        uid: &str,
        name: &str,
        reason: Option<&str>,
        out: &mut Responder,
    ) -> Result<(), HandlerError> {
        let handle = self
            .channel(name)
            .ok_or_else(|| HandlerError::NoSuchChannel(name.to_string()))?;
        let Some(user) = self.user(uid) else {
            return Ok(());
        };
        let mut channel = handle.write();
        if !channel.is_member(uid) {
            return Err(channel_error(&channel.name, ChannelError::NotOnChannel));
        }
        let mut params = vec![channel.name.clone()];
        params.extend(reason.map(str::to_string));
        let part = Message::new("PART", params).with_prefix(user.read().prefix());
        self.broadcast_to_channel(&channel, &part, Some(uid));
        out.send(part);
        self.unlink(&handle, &mut channel, &mut user.write());
        Ok(())
    }

    /// `JOIN 0`: part every joined channel.
    pub fn part_all(&self, uid: &str, out: &mut Responder) {
        let Some(user) = self.user(uid) else {
            return;
        };
        let channels: Vec<String> = user.read().channels.iter().cloned().collect();
        for name in channels {
            if let Err(e) = self.part_channel(uid, &name, None, out) {
                debug!(%uid, channel = %name, error = %e, "Part during JOIN 0 failed");
            }
        }
    }

    /// Remove `target` from a channel on behalf of `uid`.
    ///
    /// The kicker needs at least halfop and at least the level required to
    /// set the victim's highest prefix.
    pub fn kick(
        &self,
        uid: &str,
        name: &str,
        target: &str,
        reason: &str,
        out: &mut Responder,
    ) -> Result<(), HandlerError> {
        let handle = self
            .channel(name)
            .ok_or_else(|| HandlerError::NoSuchChannel(name.to_string()))?;
        let (Some(actor), Some(victim)) = (self.user(uid), self.find_user(target)) else {
            return Err(HandlerError::NoSuchNick(target.to_string()));
        };
        let mut channel = handle.write();
        if !channel.is_member(uid) {
            return Err(channel_error(&channel.name, ChannelError::NotOnChannel));
        }
        let (victim_uid, victim_nick) = {
            let v = victim.read();
            (v.uid.clone(), v.nick.clone())
        };
        let Some(victim_access) = channel.access_of(&victim_uid).map(str::to_string) else {
            return Err(channel_error(&channel.name, ChannelError::UserNotInChannel(victim_nick)));
        };

        let mut allowed = channel.is_user_at_least(&self.hierarchy, uid, "halfop")?;
        if allowed && let Some(rank) = self.hierarchy.highest_rank(&victim_access) {
            let needed = self.hierarchy.levels()[rank].min_level_to_set.clone();
            allowed = channel.is_user_at_least(&self.hierarchy, uid, &needed)?;
        }
        if !allowed {
            return Err(channel_error(&channel.name, ChannelError::ChanOpPrivsNeeded));
        }

        let kick = Message::new("KICK", [channel.name.as_str(), victim_nick.as_str(), reason])
            .with_prefix(actor.read().prefix());
        self.broadcast_to_channel(&channel, &kick, Some(uid));
        out.send(kick);
        self.unlink(&handle, &mut channel, &mut victim.write());
        Ok(())
    }

    /// Change a channel topic. `PreTopicChange` hooks may veto it.
    pub fn set_topic(&self, uid: &str, name: &str, text: &str, out: &mut Responder) -> Result<(), HandlerError> {
        let handle = self
            .channel(name)
            .ok_or_else(|| HandlerError::NoSuchChannel(name.to_string()))?;
        let Some(user) = self.user_snapshot(uid) else {
            return Ok(());
        };
        let mut channel = handle.write();
        if !channel.is_member(uid) {
            return Err(channel_error(&channel.name, ChannelError::NotOnChannel));
        }
        if self.hooks.pre_topic_change(self, &channel, &user, text, out).is_deny() {
            return Ok(());
        }
        channel.topic = (!text.is_empty()).then(|| Topic {
            text: text.to_string(),
            set_by: user.prefix().to_string(),
            set_at: chrono::Utc::now().timestamp(),
        });
        let msg = Message::new("TOPIC", [channel.name.as_str(), text]).with_prefix(user.prefix());
        self.broadcast_to_channel(&channel, &msg, Some(uid));
        out.send(msg);
        Ok(())
    }

    /// Deliver PRIVMSG / NOTICE / TAGMSG to a channel through the message hooks.
    ///
    /// Client-only tags (`+key`) reach members that negotiated message-tags.
    pub fn channel_message(
        &self,
        uid: &str,
        name: &str,
        kind: MessageKind,
        text: &str,
        client_tags: &[Tag],
        out: &mut Responder,
    ) -> Result<(), HandlerError> {
        let handle = self
            .channel(name)
            .ok_or_else(|| HandlerError::NoSuchChannel(name.to_string()))?;
        let Some(user) = self.user_snapshot(uid) else {
            return Ok(());
        };
        let channel = handle.read();
        if self
            .hooks
            .channel_message(kind, self, &channel, &user, text, out)
            .is_deny()
        {
            return Ok(());
        }

        let params: Vec<&str> = match kind {
            MessageKind::Tagmsg => vec![channel.name.as_str()],
            _ => vec![channel.name.as_str(), text],
        };
        let plain = Message::new(kind.command(), params).with_prefix(user.prefix());
        let mut tagged = plain.clone();
        tagged.tags = client_tags.to_vec();

        for member_uid in channel.member_uids() {
            if member_uid == uid {
                continue;
            }
            let Some(member) = self.user(member_uid) else {
                continue;
            };
            let wants_tags = member.read().has_cap("message-tags");
            match (kind, wants_tags) {
                (MessageKind::Tagmsg, false) => {}
                (_, true) => self.send_to(member_uid, tagged.clone()),
                (_, false) => self.send_to(member_uid, plain.clone()),
            }
        }
        Ok(())
    }

    /// Run a channel MODE batch and broadcast the applied changes once.
    pub fn apply_channel_modes(
        &self,
        uid: &str,
        name: &str,
        changes: &[ModeChange],
        out: &mut Responder,
    ) -> Result<Vec<ModeChange>, HandlerError> {
        let handle = self
            .channel(name)
            .ok_or_else(|| HandlerError::NoSuchChannel(name.to_string()))?;
        let Some(user) = self.user_snapshot(uid) else {
            return Ok(Vec::new());
        };
        let mut channel = handle.write();
        if self.hooks.mode_change(self, &channel, &user, changes, out).is_deny() {
            return Ok(Vec::new());
        }

        let lookup = |nick: &str| self.mode_target(nick);
        let env = ModeEnv {
            registry: &self.modes,
            hierarchy: &self.hierarchy,
            lookup: &lookup,
            server_name: self.server_name(),
            now_ms: Matrix::now_ms(),
        };
        let source = ModeSource::User {
            uid,
            nick: &user.nick,
        };
        let applied = channel.process_modes(changes, source, &env, out)?;
        if !applied.is_empty() {
            let mut params = vec![channel.name.clone()];
            params.extend(ModeString::render(applied.iter()).into_params());
            let msg = Message::new("MODE", params).with_prefix(user.prefix());
            self.broadcast_to_channel(&channel, &msg, Some(uid));
            out.send(msg);
        }
        Ok(applied)
    }
}
