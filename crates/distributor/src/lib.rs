// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Codewell Contributors

//! The distributor: the issuance engine and user state store, fronted by a
//! minimal HTTP surface that stands in for the chat layer and the operator
//! console.

pub mod config;
pub mod error;
pub mod http;
pub mod issuance;
pub mod state;
pub mod users;

use std::sync::Arc;

use anyhow::Context;
use codewell_core::GameCatalog;
use codewell_inventory::postgres::PostgresStore;
use codewell_inventory::redis_tier::RedisWarmTier;
use codewell_inventory::Inventory;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::DistributorConfig;
use crate::issuance::{IssuanceEngine, PostgresQuotaCommit};
use crate::state::AppState;
use crate::users::PostgresUserStore;

/// Run the distributor HTTP server until shutdown.
pub async fn run(config: DistributorConfig) -> anyhow::Result<()> {
    let catalog = GameCatalog::load(&config.catalog_path).context("loading game catalog")?;

    let pg_pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
        .context("connecting to durable store")?;

    sqlx::migrate!("./migrations").run(&pg_pool).await.context("running migrations")?;

    let redis_client = redis::Client::open(config.redis_url.clone()).context("parsing redis url")?;
    let redis_manager = redis_client
        .get_connection_manager()
        .await
        .context("connecting to warm tier")?;

    let inventory = Arc::new(
        Inventory::new(
            Arc::new(PostgresStore::new(pg_pool.clone())),
            Arc::new(RedisWarmTier::new(redis_manager)),
        )
        .with_refill(config.warm_refill, config.warm_ttl_secs),
    );
    let users: Arc<dyn crate::users::UserStore> = Arc::new(PostgresUserStore::new(pg_pool.clone()));
    let commit = Arc::new(PostgresQuotaCommit::new(pg_pool));
    let issuance = IssuanceEngine::new(
        catalog.clone(),
        Arc::clone(&inventory),
        Arc::clone(&users),
        commit,
        Default::default(),
        config.draw_default,
        config.draw_boosted,
    );

    let shutdown = CancellationToken::new();
    let state = Arc::new(AppState { catalog, inventory, users, issuance });

    let router = http::build_router(Arc::clone(&state));
    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received");
            signal_token.cancel();
        }
    });

    tracing::info!(host = %config.host, port = config.port, "distributor listening");
    axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await?;
    Ok(())
}
