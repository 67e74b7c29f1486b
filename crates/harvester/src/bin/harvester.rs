// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Codewell Contributors

use clap::Parser;
use tracing::error;

use codewell_harvester::config::HarvesterConfig;

#[tokio::main]
async fn main() {
    let config = HarvesterConfig::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let _ = rustls::crypto::ring::default_provider().install_default();

    if let Err(e) = codewell_harvester::run(config).await {
        error!("fatal: {e:#}");
        std::process::exit(1);
    }
}
