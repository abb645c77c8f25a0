mod api;
mod cli;
mod router;
mod sse;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum_server::tls_rustls::RustlsConfig;
use clap::Parser;
use tracing::{info, warn};

use loghive_core::diag::{self, ConsoleSink};
use loghive_ingest::{SourceManager, UdpReceiver};
use loghive_store::LogStore;

use cli::CliArgs;

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {e}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let args = CliArgs::parse();
    if args.legacy_console {
        diag::set_sink(Arc::new(ConsoleSink));
    }

    let store = Arc::new(LogStore::open(&args.db)?);
    info!(
        "store {} opened with {} existing logs",
        args.db.display(),
        store.count()?
    );

    let sources = Arc::new(SourceManager::new(store.clone()));
    for (i, path) in args.tail.iter().enumerate() {
        let name = args.tail_name.get(i).cloned();
        match sources.add_file(path, name).await {
            Some(id) => info!("tailing {} as source {id}", path.display()),
            None => warn!("could not start tailing {}", path.display()),
        }
    }

    let udp = UdpReceiver::bind(store.clone(), args.udp_port).await?;

    let state = state::AppState::new(store.clone(), sources.clone());
    let app = router::build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.http_port));
    let scheme = if args.cert.is_some() { "https" } else { "http" };
    info!("MCP endpoint: {scheme}://localhost:{}/sse", args.http_port);
    info!("UDP ingest:   localhost:{}", args.udp_port);

    match (&args.cert, &args.key) {
        (Some(cert), Some(key)) => {
            let tls = RustlsConfig::from_pem_file(cert, key).await?;
            let handle = axum_server::Handle::new();
            let shutdown_handle = handle.clone();
            tokio::spawn(async move {
                shutdown_signal().await;
                shutdown_handle.graceful_shutdown(Some(Duration::from_secs(5)));
            });
            axum_server::bind_rustls(addr, tls)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
        _ => {
            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
    }

    // Producers stop before the store is dropped.
    info!("shutting down");
    sources.stop_all().await;
    udp.stop().await;
    info!("shutdown complete, {} logs stored", store.count()?);
    Ok(())
}
