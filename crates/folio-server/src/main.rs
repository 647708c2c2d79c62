// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Folio: images in, one PDF out.
//
// Entry point. Initialises logging, resolves the configuration, and runs the
// conversion server until Ctrl-C.

use folio_core::ServerConfig;
use folio_server::ConvertServer;

#[tokio::main]
async fn main() -> folio_core::error::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Folio starting");

    let config = ServerConfig::from_env();
    let mut server = ConvertServer::new(config);
    server.start().await?;

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "cannot listen for shutdown signal");
    }

    server.stop().await?;
    tracing::info!("Folio stopped");
    Ok(())
}
