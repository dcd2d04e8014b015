//! Gateway - TCP listener that accepts incoming connections.
//!
//! The Gateway binds the listen socket and spawns a Connection task for
//! each incoming client.

use super::connection::Connection;
use super::dns::ReverseResolver;
use crate::state::Matrix;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, instrument};

/// The Gateway accepts incoming TCP connections and spawns handlers.
pub struct Gateway {
    listener: TcpListener,
    matrix: Arc<Matrix>,
    resolver: Option<Arc<ReverseResolver>>,
}

impl Gateway {
    /// Bind the gateway to `addr`. Port 0 picks an ephemeral port.
    pub async fn bind(addr: SocketAddr, matrix: Arc<Matrix>) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let resolver = matrix
            .config
            .resolve_hostnames
            .then(|| Arc::new(ReverseResolver::new()));
        info!(address = %listener.local_addr()?, resolve = resolver.is_some(), "Listener bound");
        Ok(Self {
            listener,
            matrix,
            resolver,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Run the gateway, accepting connections forever.
    #[instrument(skip(self), name = "gateway")]
    pub async fn run(self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let uid = self.matrix.next_uid();
                    info!(%addr, %uid, "Connection accepted");
                    if let Err(e) = stream.set_nodelay(true) {
                        error!(%addr, error = %e, "Failed to set TCP_NODELAY");
                    }
                    let connection = Connection::new(
                        uid,
                        stream,
                        addr,
                        Arc::clone(&self.matrix),
                        self.resolver.clone(),
                    );
                    tokio::spawn(connection.run());
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }
}
