//! Channel membership handlers: JOIN, PART, KICK, TOPIC and NAMES.

mod join;
mod kick;
mod names;
mod part;
mod topic;

pub use join::JoinHandler;
pub use kick::KickHandler;
pub use names::NamesHandler;
pub use part::PartHandler;
pub use topic::TopicHandler;

#[cfg(test)]
pub(crate) mod test_support {
    use crate::handlers::{Context, Session};
    use crate::modules::load_core_modules;
    use crate::proto::{Message, Responder};
    use crate::state::{Credentials, Matrix, RegistrationGate};
    use std::collections::HashSet;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    pub fn matrix() -> Arc<Matrix> {
        let matrix = Matrix::for_tests();
        load_core_modules(&matrix).expect("modules");
        Arc::new(matrix)
    }

    pub fn register(matrix: &Matrix, uid: &str, nick: &str) -> mpsc::Receiver<Message> {
        let (tx, rx) = mpsc::channel(64);
        let creds = Credentials {
            nick: nick.into(),
            user: nick.into(),
            realname: nick.into(),
            host: "host".into(),
        };
        let mut out = Responder::new(matrix.server_name(), nick);
        matrix
            .register_user(uid, &creds, &HashSet::new(), &mut out)
            .expect("register");
        matrix.attach_sender(uid, tx);
        rx
    }

    /// Dispatch `line` as registered user `uid`; returns the replies as wire lines.
    pub async fn send(matrix: &Arc<Matrix>, uid: &str, line: &str) -> Vec<String> {
        let (tx, _rx) = mpsc::channel(8);
        let mut session = Session::new(RegistrationGate::new("127.0.0.1", false), tx);
        session.gate.mark_registered();
        session.outbound = None;
        if let Some(user) = matrix.user_snapshot(uid) {
            session.caps = user.caps.clone();
        }
        let nick = matrix.user_snapshot(uid).map_or_else(|| "*".to_string(), |u| u.nick);
        let mut out = Responder::new(matrix.server_name(), &nick);
        let msg: Message = line.parse().expect("parse");
        let addr = "127.0.0.1:1".parse().expect("addr");
        let mut ctx = Context::new(uid, matrix, &mut session, &mut out, addr);
        let _ = matrix.commands.dispatch(&mut ctx, &msg).await;
        out.drain().iter().map(|m| m.to_string()).collect()
    }

    pub fn drain(rx: &mut mpsc::Receiver<Message>) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            lines.push(msg.to_string());
        }
        lines
    }
}
