//! AlignScore HTTP server entrypoint.

use std::net::SocketAddr;
use std::time::Duration;

use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tokio::signal;

use alignscore::config::{ServerConfig, ServiceSettings};
use alignscore::constants::DEFAULT_PORT;
use alignscore::gateway::{HandlerState, create_router_with_state};
use alignscore::runner::RunnerCell;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const SMOKE_CONTEXT: &str = "The Boston Celtics won the 2024 NBA championship, beating the Dallas Mavericks in five games.";
const SMOKE_CLAIM: &str = "The Celtics won the 2024 NBA title.";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::args().any(|arg| arg == "--health-check") {
        std::process::exit(run_health_check());
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let settings = ServiceSettings::from_env();

    if std::env::args().any(|arg| arg == "--smoke-check") {
        return run_smoke_check(settings).await;
    }

    let config = ServerConfig::from_env()?;
    let addr = SocketAddr::new(config.bind_addr, config.port);

    tracing::info!(
        bind_addr = %config.bind_addr,
        port = config.port,
        model_path = %settings.model_path.display(),
        device = %settings.device,
        "AlignScore server starting"
    );

    let runner = RunnerCell::new(settings);
    runner.get_or_init().await?;

    let app = create_router_with_state(HandlerState::new(runner));

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("AlignScore shutdown complete");
    Ok(())
}

/// Loads the model and scores one known-consistent pair.
async fn run_smoke_check(settings: ServiceSettings) -> anyhow::Result<()> {
    let runner = RunnerCell::new(settings).get_or_init().await?;

    let scores = runner
        .score_async(
            vec![SMOKE_CONTEXT.to_string()],
            vec![SMOKE_CLAIM.to_string()],
            None,
            None,
        )
        .await?;

    println!("Device: {}", runner.device());
    println!("Evaluation mode: {}", runner.evaluation_mode());
    println!("Score: {:.4}", scores.first().copied().unwrap_or_default());
    Ok(())
}

fn run_health_check() -> i32 {
    let port = std::env::var("ALIGNSCORE_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT);

    let url = format!("http://127.0.0.1:{}/healthz", port);

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(_) => return 1,
    };

    rt.block_on(async {
        let client = match reqwest::Client::builder()
            .timeout(Duration::from_secs(1))
            .build()
        {
            Ok(client) => client,
            Err(_) => return 1,
        };

        match client.get(&url).send().await {
            Ok(res) if res.status().is_success() => 0,
            _ => 1,
        }
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
