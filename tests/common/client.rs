//! Test IRC client.
//!
//! Speaks raw lines over TCP and parses replies with the server's own
//! message type.

use modircd::proto::Message;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout;

/// A test IRC client.
pub struct TestClient {
    reader: BufReader<OwnedReadHalf>,
    writer: BufWriter<OwnedWriteHalf>,
    nick: String,
}

#[allow(dead_code)]
impl TestClient {
    /// Connect to a test server.
    pub async fn connect(address: &str, nick: &str) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(address).await?;
        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(read_half),
            writer: BufWriter::new(write_half),
            nick: nick.to_string(),
        })
    }

    pub fn nick(&self) -> &str {
        &self.nick
    }

    /// Send a raw IRC line.
    pub async fn send_raw(&mut self, line: &str) -> anyhow::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        if !line.ends_with("\r\n") {
            self.writer.write_all(b"\r\n").await?;
        }
        self.writer.flush().await?;
        Ok(())
    }

    /// Receive a single message from the server.
    pub async fn recv(&mut self) -> anyhow::Result<Message> {
        self.recv_timeout(Duration::from_secs(5)).await
    }

    /// Receive a message with a timeout.
    pub async fn recv_timeout(&mut self, dur: Duration) -> anyhow::Result<Message> {
        let mut line = String::new();
        let read = timeout(dur, self.reader.read_line(&mut line)).await??;
        if read == 0 {
            anyhow::bail!("connection closed");
        }
        anyhow::ensure!(line.ends_with("\r\n"), "line not CRLF terminated: {line:?}");
        line.trim_end()
            .parse::<Message>()
            .map_err(|e| anyhow::anyhow!("Parse error: {}", e))
    }

    /// Receive messages until `predicate` matches; the match is included.
    pub async fn recv_until<F>(&mut self, mut predicate: F) -> anyhow::Result<Vec<Message>>
    where
        F: FnMut(&Message) -> bool,
    {
        let mut messages = Vec::new();
        loop {
            let msg = self.recv().await?;
            let done = predicate(&msg);
            messages.push(msg);
            if done {
                return Ok(messages);
            }
        }
    }

    /// Receive until a message with `command` arrives.
    pub async fn recv_command(&mut self, command: &str) -> anyhow::Result<Vec<Message>> {
        self.recv_until(|m| m.command == command).await
    }

    /// Discard whatever arrives within a short quiet period.
    pub async fn drain(&mut self) -> Vec<Message> {
        let mut messages = Vec::new();
        while let Ok(msg) = self.recv_timeout(Duration::from_millis(100)).await {
            messages.push(msg);
        }
        messages
    }

    /// Assert nothing arrives within a short quiet period.
    pub async fn expect_silence(&mut self) -> anyhow::Result<()> {
        match self.recv_timeout(Duration::from_millis(200)).await {
            Ok(msg) => anyhow::bail!("unexpected message: {msg}"),
            Err(_) => Ok(()),
        }
    }

    /// Register with NICK + USER and consume the welcome burst up to the
    /// end of the MOTD.
    pub async fn register(&mut self) -> anyhow::Result<Vec<Message>> {
        let nick = self.nick.clone();
        self.send_raw(&format!("NICK {nick}")).await?;
        self.send_raw(&format!("USER {nick} 0 * :Test User {nick}")).await?;
        let burst = self
            .recv_until(|m| m.command == "376" || m.command == "422" || m.command == "433")
            .await?;
        anyhow::ensure!(
            burst.iter().any(|m| m.command == "001"),
            "registration failed: {:?}",
            burst.iter().map(|m| m.to_string()).collect::<Vec<_>>()
        );
        Ok(burst)
    }

    pub async fn join(&mut self, channel: &str) -> anyhow::Result<Vec<Message>> {
        self.send_raw(&format!("JOIN {channel}")).await?;
        self.recv_until(|m| m.command == "366" || m.command.starts_with('4')).await
    }

    pub async fn privmsg(&mut self, target: &str, text: &str) -> anyhow::Result<()> {
        self.send_raw(&format!("PRIVMSG {target} :{text}")).await
    }

    /// Send QUIT and wait for the closing ERROR.
    pub async fn quit(&mut self, reason: &str) -> anyhow::Result<Message> {
        self.send_raw(&format!("QUIT :{reason}")).await?;
        let messages = self.recv_command("ERROR").await?;
        messages
            .into_iter()
            .last()
            .ok_or_else(|| anyhow::anyhow!("no ERROR received"))
    }
}
