//! Labeled-response batching.
//!
//! Replies produced for one labeled command go back as a unit: one reply
//! carries the label itself, zero replies become an `ACK`, and anything more
//! is wrapped in a `labeled-response` BATCH.

use crate::caps::{BATCH, LABELED_RESPONSE};
use crate::proto::{Message, Prefix};
use std::collections::HashSet;

/// Batch reference ids recycle after this many batches.
const REF_CYCLE: u32 = 1 << 16;

/// Per-connection reply wrapper.
#[derive(Debug)]
pub struct ResponseBatcher {
    server: Prefix,
    next_ref: u32,
}

impl ResponseBatcher {
    pub fn new(server_name: &str) -> Self {
        Self {
            server: Prefix::ServerName(server_name.to_string()),
            next_ref: 0,
        }
    }

    /// The label to honour for `msg`, if the client negotiated both
    /// `labeled-response` and `batch`.
    pub fn label_for(msg: &Message, caps: &HashSet<String>) -> Option<String> {
        if !caps.contains(LABELED_RESPONSE) || !caps.contains(BATCH) {
            return None;
        }
        msg.tag("label").filter(|l| !l.is_empty()).map(str::to_string)
    }

    /// Wrap the replies of one command. Without a label they pass through
    /// untouched, in emission order.
    pub fn wrap(&mut self, label: Option<&str>, replies: Vec<Message>) -> Vec<Message> {
        let Some(label) = label else {
            return replies;
        };
        match replies.len() {
            0 => vec![
                Message::new("ACK", Vec::<String>::new())
                    .with_prefix(self.server.clone())
                    .with_tag("label", Some(label.to_string())),
            ],
            1 => replies
                .into_iter()
                .map(|m| m.with_tag("label", Some(label.to_string())))
                .collect(),
            n => {
                let reference = self.next_reference();
                let mut wrapped = Vec::with_capacity(n + 2);
                wrapped.push(
                    Message::new("BATCH", [format!("+{reference}"), "labeled-response".to_string()])
                        .with_prefix(self.server.clone())
                        .with_tag("label", Some(label.to_string())),
                );
                wrapped.extend(
                    replies
                        .into_iter()
                        .map(|m| m.with_tag("batch", Some(reference.clone()))),
                );
                wrapped.push(
                    Message::new("BATCH", [format!("-{reference}")]).with_prefix(self.server.clone()),
                );
                wrapped
            }
        }
    }

    fn next_reference(&mut self) -> String {
        let id = self.next_ref;
        self.next_ref = (self.next_ref + 1) % REF_CYCLE;
        format!("lr{id:x}")
    }
}
