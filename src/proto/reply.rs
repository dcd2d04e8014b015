//! Response emitter.
//!
//! Every reply a handler, hook or mode check produces for the acting client
//! goes through a [`Responder`]. The connection drains it once per inbound
//! command so the replies can be delivered as one labeled unit.

use super::{Message, Prefix, Response};

#[derive(Debug)]
pub struct Responder {
    server: Prefix,
    me: String,
    queue: Vec<Message>,
}

impl Responder {
    /// `me` is the first parameter of numerics: the nick, or `*` before
    /// registration.
    pub fn new(server_name: &str, me: &str) -> Self {
        Self {
            server: Prefix::ServerName(server_name.to_string()),
            me: me.to_string(),
            queue: Vec::new(),
        }
    }

    pub fn set_me(&mut self, me: &str) {
        self.me = me.to_string();
    }

    #[inline]
    pub fn me(&self) -> &str {
        &self.me
    }

    pub fn server_prefix(&self) -> Prefix {
        self.server.clone()
    }

    pub fn send(&mut self, msg: Message) {
        self.queue.push(msg);
    }

    /// Queue a numeric from the server with `me` prepended.
    pub fn numeric(&mut self, response: Response, params: &[&str]) {
        let mut all = Vec::with_capacity(params.len() + 1);
        all.push(self.me.clone());
        all.extend(params.iter().map(|p| p.to_string()));
        let msg = Message::new(response.to_string(), all).with_prefix(self.server.clone());
        self.queue.push(msg);
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn replies(&self) -> &[Message] {
        &self.queue
    }

    pub fn drain(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.queue)
    }
}
