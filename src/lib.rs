//! HTTP front ends for three generative audio models.
//!
//! Each binary wires one model into the same request flow: check the API
//! key, validate, run inference, stage a WAV file, upload it to S3 and answer
//! with a presigned link.

pub mod api;
pub mod audio;
pub mod auth;
pub mod config;
pub mod error;
pub mod inference;
pub mod staging;
pub mod storage;
pub mod text;
pub mod voices;

use std::net::SocketAddr;

use axum::Router;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber, honouring `RUST_LOG` and defaulting to `info`
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

/// Bind and serve until the process is stopped
pub async fn serve(addr: SocketAddr, app: Router) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await
}
