//! Typed hook bus.
//!
//! Each hook point has a fixed callback signature, carried by one variant of
//! [`Hook`]. Callbacks run in registration order and the first verdict other
//! than [`HookResult::Next`] ends the run. Every callback is tagged with the
//! module that registered it so an unload removes all of them at once.
//!
//! Callbacks receive already-locked entities. They must not lock channels or
//! users through the [`Matrix`] again.

use crate::proto::{ModeChange, Responder};
use crate::state::{Channel, Matrix, User};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Verdict of one hook callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookResult {
    /// Stop here and let the action proceed.
    Allow,
    /// Stop here and veto the action.
    Deny,
    /// No opinion; ask the next callback.
    Next,
}

impl HookResult {
    #[inline]
    pub fn is_deny(self) -> bool {
        self == HookResult::Deny
    }
}

/// Channel message flavours sharing one callback shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Privmsg,
    Notice,
    Tagmsg,
}

impl MessageKind {
    pub fn command(self) -> &'static str {
        match self {
            MessageKind::Privmsg => "PRIVMSG",
            MessageKind::Notice => "NOTICE",
            MessageKind::Tagmsg => "TAGMSG",
        }
    }
}

/// A join attempt as seen by `ChannelJoin` callbacks.
#[derive(Debug, Clone, Copy)]
pub struct JoinAttempt<'a> {
    pub channel: &'a Channel,
    pub user: &'a User,
    pub key: Option<&'a str>,
    /// Whether the channel is being created by this join.
    pub creating: bool,
}

/// Output of `ChannelCheckVisibility` callbacks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelVisibility {
    pub secret: bool,
}

pub type ChannelCreateFn = dyn Fn(&Matrix, &str, &User, &mut Responder) -> HookResult + Send + Sync;
pub type AfterChannelCreateFn =
    dyn Fn(&Matrix, &Channel, &User, &mut Vec<ModeChange>) -> HookResult + Send + Sync;
pub type ChannelJoinFn = dyn Fn(&Matrix, &JoinAttempt<'_>, &mut Responder) -> HookResult + Send + Sync;
/// `text` is empty for TAGMSG.
pub type ChannelMessageFn =
    dyn Fn(&Matrix, &Channel, &User, &str, &mut Responder) -> HookResult + Send + Sync;
pub type ModeChangeFn =
    dyn Fn(&Matrix, &Channel, &User, &[ModeChange], &mut Responder) -> HookResult + Send + Sync;
pub type PreTopicChangeFn =
    dyn Fn(&Matrix, &Channel, &User, &str, &mut Responder) -> HookResult + Send + Sync;
pub type UserCreateFn = dyn Fn(&Matrix, &User, &mut Vec<ModeChange>) -> HookResult + Send + Sync;
pub type UserDestroyFn = dyn Fn(&Matrix, &User) -> HookResult + Send + Sync;
pub type ChannelVisibilityFn =
    dyn Fn(&Matrix, &Channel, &User, &mut ChannelVisibility) -> HookResult + Send + Sync;

/// A callback bound to its hook point.
#[derive(Clone)]
pub enum Hook {
    /// Veto creation of a channel that does not exist yet.
    ChannelCreate(Arc<ChannelCreateFn>),
    /// Collect modes to set on a freshly created channel.
    AfterChannelCreate(Arc<AfterChannelCreateFn>),
    ChannelJoin(Arc<ChannelJoinFn>),
    ChannelMessage(MessageKind, Arc<ChannelMessageFn>),
    ModeChange(Arc<ModeChangeFn>),
    PreTopicChange(Arc<PreTopicChangeFn>),
    /// Collect modes to grant a newly registered user.
    UserCreate(Arc<UserCreateFn>),
    UserDestroy(Arc<UserDestroyFn>),
    ChannelCheckVisibility(Arc<ChannelVisibilityFn>),
}

/// Key of a hook point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPoint {
    ChannelCreate,
    AfterChannelCreate,
    ChannelJoin,
    ChannelMessage(MessageKind),
    ModeChange,
    PreTopicChange,
    UserCreate,
    UserDestroy,
    ChannelCheckVisibility,
}

impl Hook {
    pub fn channel_create<F>(f: F) -> Self
    where
        F: Fn(&Matrix, &str, &User, &mut Responder) -> HookResult + Send + Sync + 'static,
    {
        Hook::ChannelCreate(Arc::new(f))
    }

    pub fn after_channel_create<F>(f: F) -> Self
    where
        F: Fn(&Matrix, &Channel, &User, &mut Vec<ModeChange>) -> HookResult + Send + Sync + 'static,
    {
        Hook::AfterChannelCreate(Arc::new(f))
    }

    pub fn channel_join<F>(f: F) -> Self
    where
        F: Fn(&Matrix, &JoinAttempt<'_>, &mut Responder) -> HookResult + Send + Sync + 'static,
    {
        Hook::ChannelJoin(Arc::new(f))
    }

    pub fn channel_message<F>(kind: MessageKind, f: F) -> Self
    where
        F: Fn(&Matrix, &Channel, &User, &str, &mut Responder) -> HookResult + Send + Sync + 'static,
    {
        Hook::ChannelMessage(kind, Arc::new(f))
    }

    pub fn mode_change<F>(f: F) -> Self
    where
        F: Fn(&Matrix, &Channel, &User, &[ModeChange], &mut Responder) -> HookResult
            + Send
            + Sync
            + 'static,
    {
        Hook::ModeChange(Arc::new(f))
    }

    pub fn pre_topic_change<F>(f: F) -> Self
    where
        F: Fn(&Matrix, &Channel, &User, &str, &mut Responder) -> HookResult + Send + Sync + 'static,
    {
        Hook::PreTopicChange(Arc::new(f))
    }

    pub fn user_create<F>(f: F) -> Self
    where
        F: Fn(&Matrix, &User, &mut Vec<ModeChange>) -> HookResult + Send + Sync + 'static,
    {
        Hook::UserCreate(Arc::new(f))
    }

    pub fn user_destroy<F>(f: F) -> Self
    where
        F: Fn(&Matrix, &User) -> HookResult + Send + Sync + 'static,
    {
        Hook::UserDestroy(Arc::new(f))
    }

    pub fn channel_visibility<F>(f: F) -> Self
    where
        F: Fn(&Matrix, &Channel, &User, &mut ChannelVisibility) -> HookResult + Send + Sync + 'static,
    {
        Hook::ChannelCheckVisibility(Arc::new(f))
    }

    pub fn point(&self) -> HookPoint {
        match self {
            Hook::ChannelCreate(_) => HookPoint::ChannelCreate,
            Hook::AfterChannelCreate(_) => HookPoint::AfterChannelCreate,
            Hook::ChannelJoin(_) => HookPoint::ChannelJoin,
            Hook::ChannelMessage(kind, _) => HookPoint::ChannelMessage(*kind),
            Hook::ModeChange(_) => HookPoint::ModeChange,
            Hook::PreTopicChange(_) => HookPoint::PreTopicChange,
            Hook::UserCreate(_) => HookPoint::UserCreate,
            Hook::UserDestroy(_) => HookPoint::UserDestroy,
            Hook::ChannelCheckVisibility(_) => HookPoint::ChannelCheckVisibility,
        }
    }
}

struct Subscription {
    module: String,
    hook: Hook,
}

/// Server-owned registry of hook callbacks.
#[derive(Default)]
pub struct HookBus {
    hooks: RwLock<HashMap<HookPoint, Vec<Subscription>>>,
}

impl HookBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a callback to its hook point on behalf of `module`.
    pub fn add(&self, module: &str, hook: Hook) {
        self.hooks
            .write()
            .entry(hook.point())
            .or_default()
            .push(Subscription {
                module: module.to_string(),
                hook,
            });
    }

    /// Drop every callback owned by `module`. Returns how many were removed.
    pub fn remove_module(&self, module: &str) -> usize {
        let mut hooks = self.hooks.write();
        let mut removed = 0;
        for subs in hooks.values_mut() {
            let before = subs.len();
            subs.retain(|s| s.module != module);
            removed += before - subs.len();
        }
        hooks.retain(|_, subs| !subs.is_empty());
        removed
    }

    pub fn count(&self, point: HookPoint) -> usize {
        self.hooks.read().get(&point).map_or(0, Vec::len)
    }

    /// Snapshot the callbacks of a point so none run under the registry lock.
    fn snapshot(&self, point: HookPoint) -> Vec<Hook> {
        self.hooks
            .read()
            .get(&point)
            .map(|subs| subs.iter().map(|s| s.hook.clone()).collect())
            .unwrap_or_default()
    }

    fn run<F>(&self, point: HookPoint, mut call: F) -> HookResult
    where
        F: FnMut(&Hook) -> Option<HookResult>,
    {
        for hook in self.snapshot(point) {
            match call(&hook) {
                Some(HookResult::Next) | None => continue,
                Some(verdict) => return verdict,
            }
        }
        HookResult::Next
    }

    pub fn channel_create(
        &self,
        matrix: &Matrix,
        name: &str,
        user: &User,
        out: &mut Responder,
    ) -> HookResult {
        self.run(HookPoint::ChannelCreate, |hook| match hook {
            Hook::ChannelCreate(f) => Some(f(matrix, name, user, out)),
            _ => None,
        })
    }

    pub fn after_channel_create(
        &self,
        matrix: &Matrix,
        channel: &Channel,
        user: &User,
        modes: &mut Vec<ModeChange>,
    ) -> HookResult {
        self.run(HookPoint::AfterChannelCreate, |hook| match hook {
            Hook::AfterChannelCreate(f) => Some(f(matrix, channel, user, modes)),
            _ => None,
        })
    }

    pub fn channel_join(
        &self,
        matrix: &Matrix,
        attempt: &JoinAttempt<'_>,
        out: &mut Responder,
    ) -> HookResult {
        self.run(HookPoint::ChannelJoin, |hook| match hook {
            Hook::ChannelJoin(f) => Some(f(matrix, attempt, out)),
            _ => None,
        })
    }

    pub fn channel_message(
        &self,
        kind: MessageKind,
        matrix: &Matrix,
        channel: &Channel,
        user: &User,
        text: &str,
        out: &mut Responder,
    ) -> HookResult {
        self.run(HookPoint::ChannelMessage(kind), |hook| match hook {
            Hook::ChannelMessage(k, f) if *k == kind => Some(f(matrix, channel, user, text, out)),
            _ => None,
        })
    }

    pub fn mode_change(
        &self,
        matrix: &Matrix,
        channel: &Channel,
        user: &User,
        changes: &[ModeChange],
        out: &mut Responder,
    ) -> HookResult {
        self.run(HookPoint::ModeChange, |hook| match hook {
            Hook::ModeChange(f) => Some(f(matrix, channel, user, changes, out)),
            _ => None,
        })
    }

    pub fn pre_topic_change(
        &self,
        matrix: &Matrix,
        channel: &Channel,
        user: &User,
        topic: &str,
        out: &mut Responder,
    ) -> HookResult {
        self.run(HookPoint::PreTopicChange, |hook| match hook {
            Hook::PreTopicChange(f) => Some(f(matrix, channel, user, topic, out)),
            _ => None,
        })
    }

    pub fn user_create(&self, matrix: &Matrix, user: &User, modes: &mut Vec<ModeChange>) -> HookResult {
        self.run(HookPoint::UserCreate, |hook| match hook {
            Hook::UserCreate(f) => Some(f(matrix, user, modes)),
            _ => None,
        })
    }

    pub fn user_destroy(&self, matrix: &Matrix, user: &User) -> HookResult {
        self.run(HookPoint::UserDestroy, |hook| match hook {
            Hook::UserDestroy(f) => Some(f(matrix, user)),
            _ => None,
        })
    }

    /// Ask whether `channel` is hidden from `user`.
    pub fn channel_visibility(&self, matrix: &Matrix, channel: &Channel, user: &User) -> ChannelVisibility {
        let mut visibility = ChannelVisibility::default();
        self.run(HookPoint::ChannelCheckVisibility, |hook| match hook {
            Hook::ChannelCheckVisibility(f) => Some(f(matrix, channel, user, &mut visibility)),
            _ => None,
        });
        visibility
    }
}
