#![doc = include_str!("../README.md")]

mod server;

use carstream::{CarFactory, Producer};
use clap::Parser;
use core::{future::IntoFuture, time::Duration};
use server::config::{CliArgs, ServerConfig};
use server::service::{router::build_router, state::AppState};
use server::telemetry::init_telemetry;
use tokio::{net::TcpListener, runtime::Handle, signal};
use tokio_util::sync::CancellationToken;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = ServerConfig::try_from(args)?;

    let providers = init_telemetry()?;

    // Cancelling this token stops the listener and every live subscription.
    let shutdown = CancellationToken::new();
    let producer = Producer::new(
        CarFactory::new(config.emit_interval, config.max_records),
        Handle::current(),
    )
    .with_shutdown(shutdown.clone());
    let state = AppState::new(producer, config.stream_timeout);
    let tracker = state.tracker.clone();
    let app = build_router(state, &config);

    let listener = TcpListener::bind(&config.server_addr).await?;
    log_startup_info(&config);

    tokio::spawn(shutdown_signal(shutdown.clone()));

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => result?,
        () = drain_deadline(&shutdown, config.shutdown_timeout) => {
            tracing::warn!(
                "{} streams still open after {:?}, closing them",
                tracker.inflight(),
                config.shutdown_timeout
            );
        }
    }

    tracing::info!("Service shut down successfully");
    providers.shutdown();
    Ok(())
}

fn log_startup_info(config: &ServerConfig) {
    if cfg!(debug_assertions) {
        tracing::info!(
            "Starting car service on {} with full config: {:#?}",
            config.server_addr,
            config
        );
    } else {
        tracing::info!(
            "Starting car service on {} (stream timeout {:?})",
            config.server_addr,
            config.stream_timeout
        );
    }
}

/// Resolves once shutdown has started and the drain budget has elapsed.
async fn drain_deadline(shutdown: &CancellationToken, budget: Duration) {
    shutdown.cancelled().await;
    tokio::time::sleep(budget).await;
}

async fn shutdown_signal(shutdown: CancellationToken) {
    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C signal"),
        () = terminate => tracing::info!("Received SIGTERM signal"),
    }

    tracing::info!("Shutdown signal received, terminating gracefully...");
    shutdown.cancel();
}
