use std::error::Error;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::oneshot;

use sofascore::adapters::RecordStoreAdapter;
use sofascore::api::rest::RestApi;
use sofascore::config::load_or_default;
use sofascore::storage::StorageEngine;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = load_or_default(Path::new("config.yaml"))?;

    println!(
        "Starting SofaScore with {}s storage chunks",
        config.storage.chunk_duration_secs
    );

    let storage = Arc::new(StorageEngine::new(&config));
    let adapter = Arc::new(RecordStoreAdapter::new(
        Arc::clone(&storage),
        config.adapter.lookback(),
    ));
    let api = RestApi::new(Arc::clone(&storage), adapter);

    println!("Starting server on {}:{}", config.api.host, config.api.port);

    // Create a channel for the shutdown signal
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let routes = api.routes();
    let addr: SocketAddr = format!("{}:{}", config.api.host, config.api.port).parse()?;

    let (_, server) = warp::serve(routes).bind_with_graceful_shutdown(addr, async move {
        shutdown_rx.await.ok();
        println!("Shutting down server...");
    });

    let server_handle = tokio::spawn(server);

    // Wait for Ctrl+C
    signal::ctrl_c().await?;
    println!("Ctrl+C received, starting graceful shutdown");

    shutdown_tx.send(()).ok();
    server_handle.await?;

    println!("Server shutdown complete");
    Ok(())
}
