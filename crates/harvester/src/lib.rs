// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Codewell Contributors

//! The Harvester: a Supervisor that keeps one Worker alive per
//! `(game, copy)` pair, each driving the upstream promo API through its
//! login/emulate/mint state machine and appending minted codes to the shared
//! Inventory.

pub mod client;
pub mod config;
pub mod supervisor;
pub mod worker;

use std::sync::Arc;

use anyhow::Context;
use codewell_core::{GameCatalog, ProxyPool};
use codewell_inventory::postgres::PostgresStore;
use codewell_inventory::redis_tier::RedisWarmTier;
use codewell_inventory::Inventory;
use tokio_util::sync::CancellationToken;

use crate::config::HarvesterConfig;
use crate::supervisor::Supervisor;

/// Run the harvester fleet until cancelled (SIGINT/SIGTERM).
pub async fn run(config: HarvesterConfig) -> anyhow::Result<()> {
    let catalog = GameCatalog::load(&config.catalog_path).context("loading game catalog")?;
    let proxies = ProxyPool::load(&config.proxy_list_path).context("loading proxy list")?;

    let pg_pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
        .context("connecting to durable store")?;
    let redis_client = redis::Client::open(config.redis_url.clone()).context("parsing redis url")?;
    let redis_manager = redis_client
        .get_connection_manager()
        .await
        .context("connecting to warm tier")?;

    let inventory = Arc::new(
        Inventory::new(Arc::new(PostgresStore::new(pg_pool)), Arc::new(RedisWarmTier::new(redis_manager)))
            .with_refill(config.warm_refill, config.warm_ttl_secs),
    );

    let shutdown = CancellationToken::new();
    let supervisor =
        Supervisor::with_base_url(catalog, proxies, inventory, shutdown.clone(), config.upstream_base_url.clone())?;

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received");
            signal_token.cancel();
        }
    });

    supervisor.run().await
}
