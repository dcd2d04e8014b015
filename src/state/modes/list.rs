//! List-mode storage (bans, exceptions).

use crate::proto::irc_eq;
use crate::proto::wildcard::matches_hostmask;
use std::collections::HashMap;

/// One list entry. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub value: String,
    pub creator: String,
    pub timestamp_ms: i64,
}

/// Per-entity list entries keyed by mode letter.
#[derive(Debug, Clone, Default)]
pub struct ListModeStore {
    lists: HashMap<char, Vec<ListEntry>>,
}

impl ListModeStore {
    pub fn entries(&self, letter: char) -> &[ListEntry] {
        self.lists.get(&letter).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, letter: char, value: &str) -> bool {
        self.entries(letter).iter().any(|e| irc_eq(&e.value, value))
    }

    /// Whether any entry of the list matches the given user.
    pub fn matches(&self, letter: char, nick: &str, user: &str, host: &str) -> bool {
        self.entries(letter)
            .iter()
            .any(|e| matches_hostmask(nick, user, host, &e.value))
    }

    fn append(&mut self, letter: char, entry: ListEntry) -> bool {
        if self.contains(letter, &entry.value) {
            return false;
        }
        self.lists.entry(letter).or_default().push(entry);
        true
    }

    fn remove(&mut self, letter: char, value: &str) -> bool {
        let Some(list) = self.lists.get_mut(&letter) else {
            return false;
        };
        let before = list.len();
        list.retain(|e| !irc_eq(&e.value, value));
        let removed = before != list.len();
        if list.is_empty() {
            self.lists.remove(&letter);
        }
        removed
    }

    /// Start a batched change for one list. Nothing touches the store until
    /// [`ListSession::finalize`].
    pub fn session(&self, letter: char, creator: &str) -> ListSession {
        ListSession {
            letter,
            creator: creator.to_string(),
            adds: Vec::new(),
            removes: Vec::new(),
        }
    }
}

/// Pending adds and removes against one list during a MODE batch.
#[derive(Debug, Clone)]
pub struct ListSession {
    letter: char,
    creator: String,
    adds: Vec<String>,
    removes: Vec<String>,
}

impl ListSession {
    pub fn letter(&self) -> char {
        self.letter
    }

    /// Effective presence: the store plus pending changes.
    pub fn has(&self, store: &ListModeStore, value: &str) -> bool {
        if self.adds.iter().any(|v| irc_eq(v, value)) {
            return true;
        }
        if self.removes.iter().any(|v| irc_eq(v, value)) {
            return false;
        }
        store.contains(self.letter, value)
    }

    /// Queue an add. Returns false when the entry is already present.
    pub fn add(&mut self, store: &ListModeStore, value: &str) -> bool {
        if self.has(store, value) {
            return false;
        }
        if let Some(pos) = self.removes.iter().position(|v| irc_eq(v, value)) {
            self.removes.remove(pos);
        } else {
            self.adds.push(value.to_string());
        }
        true
    }

    /// Queue a removal. Returns false when the entry is absent.
    pub fn remove(&mut self, store: &ListModeStore, value: &str) -> bool {
        if !self.has(store, value) {
            return false;
        }
        if let Some(pos) = self.adds.iter().position(|v| irc_eq(v, value)) {
            self.adds.remove(pos);
        } else {
            self.removes.push(value.to_string());
        }
        true
    }

    pub fn is_empty(&self) -> bool {
        self.adds.is_empty() && self.removes.is_empty()
    }

    /// Apply the net changes to the store.
    pub fn finalize(self, store: &mut ListModeStore, timestamp_ms: i64) {
        for value in self.removes {
            store.remove(self.letter, &value);
        }
        for value in self.adds {
            store.append(
                self.letter,
                ListEntry {
                    value,
                    creator: self.creator.clone(),
                    timestamp_ms,
                },
            );
        }
    }
}
