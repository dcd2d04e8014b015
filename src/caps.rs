//! Server capability table for IRCv3 `CAP` negotiation.

use parking_lot::RwLock;

pub const BATCH: &str = "batch";
pub const LABELED_RESPONSE: &str = "labeled-response";
pub const MESSAGE_TAGS: &str = "message-tags";
pub const MULTI_PREFIX: &str = "multi-prefix";

/// Capabilities the server advertises, in advertisement order.
#[derive(Debug)]
pub struct CapabilitySet {
    names: RwLock<Vec<String>>,
}

impl Default for CapabilitySet {
    fn default() -> Self {
        Self {
            names: RwLock::new(
                [BATCH, LABELED_RESPONSE, MESSAGE_TAGS, MULTI_PREFIX]
                    .into_iter()
                    .map(String::from)
                    .collect(),
            ),
        }
    }
}

impl CapabilitySet {
    /// Add a capability. Returns false if it is already advertised.
    pub fn register(&self, name: &str) -> bool {
        let mut names = self.names.write();
        if names.iter().any(|n| n == name) {
            return false;
        }
        names.push(name.to_string());
        true
    }

    pub fn unregister(&self, name: &str) -> bool {
        let mut names = self.names.write();
        let before = names.len();
        names.retain(|n| n != name);
        before != names.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.read().iter().any(|n| n == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.names.read().clone()
    }
}
