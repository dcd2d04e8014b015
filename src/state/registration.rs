//! Per-connection registration gate.
//!
//! Registration waits on four independent events: NICK, USER, the end of
//! capability negotiation and the reverse-DNS attempt. They may arrive in
//! any order; every setter re-runs the completion check and reports
//! [`Progress::Ready`] once all of them hold. The caller then claims the
//! nick atomically and either calls [`RegistrationGate::mark_registered`]
//! or [`RegistrationGate::reject_nick`].

#[derive(Debug, Clone, PartialEq, Eq)]
enum HostLookup {
    Pending,
    Done(String),
}

/// Everything needed to create the user entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub nick: String,
    pub user: String,
    pub realname: String,
    pub host: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    /// At least one precondition is still missing.
    Waiting,
    /// All preconditions hold; the nick still has to be claimed.
    Ready(Credentials),
    /// Registration already happened. Terminal.
    Registered,
}

#[derive(Debug)]
pub struct RegistrationGate {
    nick: Option<String>,
    user: Option<(String, String)>,
    cap_negotiating: bool,
    host: HostLookup,
    fallback_host: String,
    registered: bool,
}

impl RegistrationGate {
    /// `address` is used as hostname when the lookup fails or is skipped.
    pub fn new(address: &str, resolve_host: bool) -> Self {
        Self {
            nick: None,
            user: None,
            cap_negotiating: false,
            host: if resolve_host {
                HostLookup::Pending
            } else {
                HostLookup::Done(address.to_string())
            },
            fallback_host: address.to_string(),
            registered: false,
        }
    }

    pub fn nick(&self) -> Option<&str> {
        self.nick.as_deref()
    }

    #[inline]
    pub fn is_registered(&self) -> bool {
        self.registered
    }

    pub fn is_negotiating(&self) -> bool {
        self.cap_negotiating
    }

    pub fn host_pending(&self) -> bool {
        self.host == HostLookup::Pending
    }

    pub fn set_nick(&mut self, nick: String) -> Progress {
        self.nick = Some(nick);
        self.check()
    }

    pub fn set_user(&mut self, user: String, realname: String) -> Progress {
        self.user = Some((user, realname));
        self.check()
    }

    /// CAP LS / REQ before registration suspends it until CAP END.
    pub fn begin_negotiation(&mut self) {
        if !self.registered {
            self.cap_negotiating = true;
        }
    }

    pub fn end_negotiation(&mut self) -> Progress {
        self.cap_negotiating = false;
        self.check()
    }

    /// Record the outcome of the reverse lookup; `None` means it failed.
    pub fn host_resolved(&mut self, hostname: Option<String>) -> Progress {
        if self.host == HostLookup::Pending {
            self.host = HostLookup::Done(hostname.unwrap_or_else(|| self.fallback_host.clone()));
        }
        self.check()
    }

    /// The claimed nick collided; wait for another NICK.
    pub fn reject_nick(&mut self) {
        self.nick = None;
    }

    pub fn mark_registered(&mut self) {
        self.registered = true;
    }

    pub fn check(&self) -> Progress {
        if self.registered {
            return Progress::Registered;
        }
        if self.cap_negotiating {
            return Progress::Waiting;
        }
        match (&self.nick, &self.user, &self.host) {
            (Some(nick), Some((user, realname)), HostLookup::Done(host)) => {
                Progress::Ready(Credentials {
                    nick: nick.clone(),
                    user: user.clone(),
                    realname: realname.clone(),
                    host: host.clone(),
                })
            }
            _ => Progress::Waiting,
        }
    }
}
