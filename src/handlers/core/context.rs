//! Command handler context and per-connection session state.

use crate::proto::{Message, Responder};
use crate::state::{Matrix, RegistrationGate, User};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;

/// State owned by one connection task.
#[derive(Debug)]
pub struct Session {
    pub gate: RegistrationGate,
    /// Negotiated capabilities. Mirrored onto the user entity once registered.
    pub caps: HashSet<String>,
    /// CAP version from `CAP LS <version>` (301 when absent).
    pub cap_version: u32,
    /// Outbound queue, handed to the Matrix on registration.
    pub outbound: Option<mpsc::Sender<Message>>,
}

impl Session {
    pub fn new(gate: RegistrationGate, outbound: mpsc::Sender<Message>) -> Self {
        Self {
            gate,
            caps: HashSet::new(),
            cap_version: 301,
            outbound: Some(outbound),
        }
    }

    #[inline]
    pub fn is_registered(&self) -> bool {
        self.gate.is_registered()
    }
}

/// Handler context passed to each command handler.
pub struct Context<'a> {
    /// The connection's unique ID, also the user's once registered.
    pub uid: &'a str,
    /// Shared server state.
    pub matrix: &'a Arc<Matrix>,
    pub session: &'a mut Session,
    /// Replies to the issuing client for this command.
    pub out: &'a mut Responder,
    pub remote_addr: SocketAddr,
}

impl<'a> Context<'a> {
    pub fn new(
        uid: &'a str,
        matrix: &'a Arc<Matrix>,
        session: &'a mut Session,
        out: &'a mut Responder,
        remote_addr: SocketAddr,
    ) -> Self {
        Self {
            uid,
            matrix,
            session,
            out,
            remote_addr,
        }
    }

    #[inline]
    pub fn server_name(&self) -> &str {
        self.matrix.server_name()
    }

    pub fn user(&self) -> Option<Arc<RwLock<User>>> {
        self.matrix.user(self.uid)
    }

    pub fn user_snapshot(&self) -> Option<User> {
        self.matrix.user_snapshot(self.uid)
    }

    /// Current nick, the pending one before registration, or `*`.
    pub fn nick(&self) -> String {
        if let Some(user) = self.user() {
            return user.read().nick.clone();
        }
        self.session.gate.nick().unwrap_or("*").to_string()
    }
}
