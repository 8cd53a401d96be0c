//! Tool server: bind, serve, shut down.

use anyhow::{Context, Result};
use axum::Router;
use std::sync::Arc;
use tracing::info;
use vane::{router, TransportOptions, VaneState};
use vaneconf::{TransportConfig, VaneConfig};

use crate::openmeteo::ArchiveClient;
use crate::tools::WeatherHandler;

/// Shared state type for the weather server.
pub type WeatherState = VaneState<WeatherHandler>;

/// Transport options from the `[transport]` section.
pub fn transport_options(config: &TransportConfig) -> TransportOptions {
    TransportOptions {
        stream_path: config.stream_path.clone(),
        message_path: config.message_path.clone(),
        message_aliases: config.message_aliases.clone(),
        keep_alive: config.keep_alive(),
        tool_timeout: config.tool_timeout(),
        event_buffer: config.event_buffer,
        max_body_bytes: config.max_body_bytes,
    }
}

/// Build the handler, state and router without binding.
pub fn app(config: &VaneConfig) -> Result<(Router, Arc<WeatherState>)> {
    let archive = ArchiveClient::new(
        config.weather.archive_url.clone(),
        config.weather.request_timeout(),
    )
    .context("Failed to build archive client")?;

    let state = Arc::new(VaneState::with_options(
        WeatherHandler::new(archive),
        transport_options(&config.transport),
    ));

    Ok((router(Arc::clone(&state)), state))
}

/// Run the tool server until SIGINT or SIGTERM.
pub async fn run(config: VaneConfig) -> Result<()> {
    let (app, state) = app(&config)?;

    let addr = config.bind.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("weathervane ready on http://{}", addr);
    info!("   Stream:   GET  {}", config.transport.stream_path);
    info!("   Messages: POST {}", config.transport.message_path);
    for tool in state.tools.iter() {
        info!("   Tool: {}", tool.name);
    }
    if let Some(timeout) = config.transport.tool_timeout() {
        info!("   Tool timeout: {:?}", timeout);
    }

    let shutdown_state = Arc::clone(&state);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let closed = shutdown_state.sessions.len();
            // Open streams would otherwise hold graceful shutdown forever
            shutdown_state.shutdown();
            info!(sessions = closed, "Closed open sessions");
        })
        .await
        .context("Server error")?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received SIGINT, shutting down...");
        }
        _ = terminate() => {
            info!("Received SIGTERM, shutting down...");
        }
    }
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{signal, SignalKind};
    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install SIGTERM handler");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}
