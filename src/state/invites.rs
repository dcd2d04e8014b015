//! Pending channel invitations.

use parking_lot::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invite {
    pub invited: String,
    /// Folded channel name.
    pub channel: String,
    pub inviter: String,
}

/// Invitations waiting for a matching join.
#[derive(Debug, Default)]
pub struct InviteStore {
    invites: Mutex<Vec<Invite>>,
}

impl InviteStore {
    /// Record an invite; a repeated invite to the same channel replaces the inviter.
    pub fn add(&self, invited: &str, channel: &str, inviter: &str) {
        let mut invites = self.invites.lock();
        invites.retain(|i| !(i.invited == invited && i.channel == channel));
        invites.push(Invite {
            invited: invited.to_string(),
            channel: channel.to_string(),
            inviter: inviter.to_string(),
        });
    }

    /// Remove and return the invite for this user and channel, if any.
    pub fn take(&self, invited: &str, channel: &str) -> Option<Invite> {
        let mut invites = self.invites.lock();
        let pos = invites
            .iter()
            .position(|i| i.invited == invited && i.channel == channel)?;
        Some(invites.remove(pos))
    }

    pub fn contains(&self, invited: &str, channel: &str) -> bool {
        self.invites
            .lock()
            .iter()
            .any(|i| i.invited == invited && i.channel == channel)
    }

    /// Drop every invite addressed to a departing user.
    pub fn purge_user(&self, invited: &str) -> usize {
        let mut invites = self.invites.lock();
        let before = invites.len();
        invites.retain(|i| i.invited != invited);
        before - invites.len()
    }

    /// Drop every invite to a channel that no longer exists.
    pub fn purge_channel(&self, channel: &str) -> usize {
        let mut invites = self.invites.lock();
        let before = invites.len();
        invites.retain(|i| i.channel != channel);
        before - invites.len()
    }

    pub fn len(&self) -> usize {
        self.invites.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_consumes_once() {
        let store = InviteStore::default();
        store.add("u1", "#chan", "alice");
        assert!(store.contains("u1", "#chan"));
        assert_eq!(store.take("u1", "#chan").map(|i| i.inviter).as_deref(), Some("alice"));
        assert!(store.take("u1", "#chan").is_none());
    }

    #[test]
    fn test_purge_user() {
        let store = InviteStore::default();
        store.add("u1", "#a", "x");
        store.add("u1", "#b", "x");
        store.add("u2", "#a", "x");
        assert_eq!(store.purge_user("u1"), 2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_purge_channel() {
        let store = InviteStore::default();
        store.add("u1", "#a", "x");
        store.add("u2", "#a", "x");
        store.add("u1", "#b", "x");
        assert_eq!(store.purge_channel("#a"), 2);
        assert!(!store.contains("u1", "#a"));
        assert!(store.contains("u1", "#b"));
    }

    #[test]
    fn test_reinvite_replaces() {
        let store = InviteStore::default();
        store.add("u1", "#a", "x");
        store.add("u1", "#a", "y");
        assert_eq!(store.len(), 1);
        assert_eq!(store.take("u1", "#a").map(|i| i.inviter).as_deref(), Some("y"));
    }
}
