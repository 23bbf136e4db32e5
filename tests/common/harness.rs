//! Test server harness.

use alignscore::engine::{DeviceKind, MockEngine};
use alignscore::gateway::{HandlerState, create_router_with_state};
use alignscore::runner::{Runner, RunnerCell};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

const STARTUP_WAIT_TIMEOUT_SECS: u64 = 5;
const STARTUP_POLL_INTERVAL_MS: u64 = 50;

#[derive(Debug, Clone)]
pub struct TestServerConfig {
    pub evaluation_mode: String,
    pub batch_size: usize,
}

impl Default for TestServerConfig {
    fn default() -> Self {
        Self {
            evaluation_mode: "nli_sp".to_string(),
            batch_size: 8,
        }
    }
}

pub struct TestServer {
    pub addr: SocketAddr,
    pub engine: Arc<MockEngine>,
    _server_handle: JoinHandle<()>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl TestServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

pub async fn wait_for_server_ready(
    addr: SocketAddr,
    timeout: Duration,
    interval: Duration,
) -> Result<(), ServerStartupError> {
    let start = std::time::Instant::now();

    loop {
        if start.elapsed() > timeout {
            return Err(ServerStartupError::Timeout);
        }

        match tokio::net::TcpStream::connect(addr).await {
            Ok(_) => return Ok(()),
            Err(_) => {
                tokio::time::sleep(interval).await;
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServerStartupError {
    #[error("Server failed to start within timeout")]
    Timeout,
    #[error("Failed to bind to address: {0}")]
    BindError(#[from] std::io::Error),
    #[error("Server startup failed: {0}")]
    StartupFailed(String),
}

/// Spawns a server backed by [`MockEngine`] on an ephemeral port.
///
/// The runner is warmed before the listener accepts traffic, as the binary does.
pub async fn spawn_test_server(config: TestServerConfig) -> Result<TestServer, ServerStartupError> {
    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
    let local_addr = listener.local_addr()?;

    let engine = Arc::new(MockEngine::new());
    let factory_engine = Arc::clone(&engine);
    let cell = RunnerCell::with_factory(move || {
        Ok(Runner::with_engine(
            factory_engine.clone(),
            DeviceKind::Cpu,
            config.evaluation_mode.clone(),
            config.batch_size,
        ))
    });

    cell.get_or_init()
        .await
        .map_err(|e| ServerStartupError::StartupFailed(e.to_string()))?;

    let app = create_router_with_state(HandlerState::new(cell));

    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .unwrap();
    });

    wait_for_server_ready(
        local_addr,
        Duration::from_secs(STARTUP_WAIT_TIMEOUT_SECS),
        Duration::from_millis(STARTUP_POLL_INTERVAL_MS),
    )
    .await?;

    Ok(TestServer {
        addr: local_addr,
        engine,
        _server_handle: server_handle,
        shutdown_tx: Some(shutdown_tx),
    })
}
