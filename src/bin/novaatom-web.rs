//! NovaAtom web editor - edit a file from the browser
//!
//! Listens on 127.0.0.1, port `PORT` (default 5000).

use std::net::SocketAddr;

use anyhow::Context;
use novaatom::core::config::process_env;
use novaatom::web::{self, DEFAULT_PORT};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::filter::LevelFilter::INFO)
        .init();

    let port = match process_env("PORT") {
        Some(value) => value
            .parse::<u16>()
            .with_context(|| format!("Invalid PORT: {}", value))?,
        None => DEFAULT_PORT,
    };
    let addr = SocketAddr::from(([127, 0, 0, 1], port));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(async {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to listen on {}", addr))?;
        tracing::info!("Web editor listening on http://{}", addr);
        axum::serve(listener, web::router())
            .await
            .context("Web editor stopped")
    })
}
