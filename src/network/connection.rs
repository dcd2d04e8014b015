//! Connection - handles one client connection.
//!
//! Each connection runs in its own task. Inbound lines are dispatched one
//! at a time, in arrival order; the replies a command produces are written
//! back before the next line is read. Three sources feed the loop:
//!
//! ```text
//!   socket lines ──┐
//!   reverse DNS  ──┼──▶ tokio::select! ──▶ FramedWrite
//!   SendQ (mpsc) ──┘
//! ```
//!
//! The reverse lookup only holds back registration; commands keep flowing
//! while it runs. Messages from other users arrive through the SendQ, whose
//! sender the Matrix owns once the client is registered.

use super::batch::ResponseBatcher;
use super::dns::ReverseResolver;
use crate::error::HandlerError;
use crate::handlers::{Context, Session, complete_registration};
use crate::proto::{Message, Responder};
use crate::state::{Matrix, RegistrationGate, Uid};
use crate::telemetry::connection_span;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec, LinesCodecError};
use tracing::{Instrument, debug, info, warn};

/// 512 bytes of message plus the IRCv3 tag allowance.
pub const MAX_LINE_LEN: usize = 512 + 8191;

type Writer = FramedWrite<OwnedWriteHalf, LinesCodec>;

/// A client connection handler.
pub struct Connection {
    uid: Uid,
    stream: TcpStream,
    addr: SocketAddr,
    matrix: Arc<Matrix>,
    resolver: Option<Arc<ReverseResolver>>,
}

enum Flow {
    Continue,
    Close(String),
}

/// Per-connection state shared by the loop branches.
struct Link {
    uid: Uid,
    addr: SocketAddr,
    matrix: Arc<Matrix>,
    session: Session,
    batcher: ResponseBatcher,
    writer: Writer,
}

impl Connection {
    /// `resolver` is `None` when hostnames are not resolved.
    pub fn new(
        uid: Uid,
        stream: TcpStream,
        addr: SocketAddr,
        matrix: Arc<Matrix>,
        resolver: Option<Arc<ReverseResolver>>,
    ) -> Self {
        Self {
            uid,
            stream,
            addr,
            matrix,
            resolver,
        }
    }

    /// Serve the client until it quits, is killed or the socket closes.
    pub async fn run(self) {
        let span = connection_span(&self.uid, &self.addr.to_string());
        self.serve().instrument(span).await
    }

    async fn serve(self) {
        let Connection {
            uid,
            stream,
            addr,
            matrix,
            resolver,
        } = self;
        info!("Client connected");

        let (read_half, write_half) = stream.into_split();
        let mut reader = FramedRead::new(read_half, LinesCodec::new_with_max_length(MAX_LINE_LEN));
        let (tx, mut rx) = mpsc::channel::<Message>(matrix.config.limits.sendq);
        let ip = addr.ip();
        let gate = RegistrationGate::new(&ip.to_string(), resolver.is_some());

        let mut lookup_done = !gate.host_pending();
        let lookup = async move {
            match resolver {
                Some(resolver) => resolver.lookup(ip).await,
                None => None,
            }
        };
        tokio::pin!(lookup);

        let mut link = Link {
            uid,
            addr,
            batcher: ResponseBatcher::new(matrix.server_name()),
            matrix,
            session: Session::new(gate, tx),
            writer: FramedWrite::new(write_half, LinesCodec::new()),
        };

        let reason = loop {
            let flow = tokio::select! {
                host = &mut lookup, if !lookup_done => {
                    lookup_done = true;
                    link.on_host(host).await
                }
                line = reader.next() => match line {
                    Some(Ok(line)) => link.on_line(&line).await,
                    Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                        warn!(max = MAX_LINE_LEN, "Input line too long");
                        Flow::Close("Input line too long".to_string())
                    }
                    Some(Err(LinesCodecError::Io(e))) => {
                        debug!(error = %e, "Read error");
                        Flow::Close(format!("Read error: {e}"))
                    }
                    None => Flow::Close("Connection closed".to_string()),
                },
                queued = rx.recv() => match queued {
                    Some(msg) => link.write(vec![msg]).await,
                    // the Matrix dropped our sender: KILL or SendQ overflow
                    None => Flow::Close("Disconnected by server".to_string()),
                },
            };
            if let Flow::Close(reason) = flow {
                break reason;
            }
        };

        link.matrix.destroy_connection(&link.uid, &reason);
        info!(%reason, "Client disconnected");
    }
}

impl Link {
    fn responder(&self) -> Responder {
        let nick = match self.matrix.user(&self.uid) {
            Some(user) => user.read().nick.clone(),
            None => self.session.gate.nick().unwrap_or("*").to_string(),
        };
        Responder::new(self.matrix.server_name(), &nick)
    }

    async fn on_host(&mut self, host: Option<String>) -> Flow {
        debug!(host = ?host, "Hostname lookup complete");
        let progress = self.session.gate.host_resolved(host);
        let mut out = self.responder();
        {
            let mut ctx = Context::new(&self.uid, &self.matrix, &mut self.session, &mut out, self.addr);
            complete_registration(&mut ctx, progress);
        }
        self.write(out.drain()).await
    }

    async fn on_line(&mut self, line: &str) -> Flow {
        if line.trim().is_empty() {
            return Flow::Continue;
        }
        let msg: Message = match line.parse() {
            Ok(msg) => msg,
            Err(e) => {
                debug!(error = %e, "Unparsable line");
                return Flow::Continue;
            }
        };
        debug!(raw = %line, "Received message");

        let label = ResponseBatcher::label_for(&msg, &self.session.caps);
        let mut out = self.responder();
        let result = {
            let mut ctx = Context::new(&self.uid, &self.matrix, &mut self.session, &mut out, self.addr);
            self.matrix.commands.dispatch(&mut ctx, &msg).await
        };

        let replies = self.batcher.wrap(label.as_deref(), out.drain());
        if let Flow::Close(reason) = self.write(replies).await {
            return Flow::Close(reason);
        }

        match result {
            Err(HandlerError::Quit(reason)) => {
                let reason = format!("Quit: {}", reason.as_deref().unwrap_or("Client Quit"));
                let host = self
                    .matrix
                    .user_snapshot(&self.uid)
                    .map_or_else(|| self.addr.ip().to_string(), |u| u.host);
                let error = Message::new("ERROR", [format!("Closing Link: {host} ({reason})")]);
                // best effort, the connection closes either way
                let _ = self.write(vec![error]).await;
                Flow::Close(reason)
            }
            _ => Flow::Continue,
        }
    }

    async fn write(&mut self, messages: Vec<Message>) -> Flow {
        if messages.is_empty() {
            return Flow::Continue;
        }
        for msg in messages {
            // LinesCodec terminates with \n only
            if let Err(e) = self.writer.feed(format!("{msg}\r")).await {
                debug!(error = %e, "Write error");
                return Flow::Close("Write error".to_string());
            }
        }
        match SinkExt::<String>::flush(&mut self.writer).await {
            Ok(()) => Flow::Continue,
            Err(e) => {
                debug!(error = %e, "Write error");
                Flow::Close("Write error".to_string())
            }
        }
    }
}
