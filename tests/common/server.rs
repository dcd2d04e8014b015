//! Test server management.
//!
//! Runs a modircd gateway inside the test runtime on an ephemeral port.

use modircd::config::{Config, OperBlock};
use modircd::modules::load_core_modules;
use modircd::network::Gateway;
use modircd::state::Matrix;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// A test server instance. The gateway stops when it is dropped.
pub struct TestServer {
    addr: SocketAddr,
    #[allow(dead_code)]
    pub matrix: Arc<Matrix>,
    task: JoinHandle<()>,
}

impl TestServer {
    /// Spawn a server with the test configuration, a one-line MOTD and a
    /// `testop`/`testpass` oper block.
    pub async fn spawn() -> anyhow::Result<Self> {
        Self::spawn_with(|_| {}).await
    }

    /// Spawn a server after adjusting the test configuration.
    pub async fn spawn_with<F>(adjust: F) -> anyhow::Result<Self>
    where
        F: FnOnce(&mut Config),
    {
        let mut config = Config::for_tests();
        config.motd.lines = vec!["Test Server".to_string()];
        config.oper.push(OperBlock {
            name: "testop".to_string(),
            password: "testpass".to_string(),
            global: true,
        });
        adjust(&mut config);

        let matrix = Arc::new(Matrix::new(&config)?);
        load_core_modules(&matrix)?;
        let gateway = Gateway::bind(config.listen.address, Arc::clone(&matrix)).await?;
        let addr = gateway.local_addr()?;
        let task = tokio::spawn(gateway.run());

        Ok(Self { addr, matrix, task })
    }

    /// Get the server address.
    pub fn address(&self) -> String {
        self.addr.to_string()
    }

    /// Create a new test client connected to this server.
    pub async fn connect(&self, nick: &str) -> anyhow::Result<super::client::TestClient> {
        super::client::TestClient::connect(&self.address(), nick).await
    }

    /// Connect and register a client, discarding the welcome burst.
    #[allow(dead_code)]
    pub async fn connect_registered(&self, nick: &str) -> anyhow::Result<super::client::TestClient> {
        let mut client = self.connect(nick).await?;
        client.register().await?;
        Ok(client)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
