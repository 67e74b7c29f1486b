// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Codewell Contributors

use std::path::PathBuf;

/// Distributor process configuration.
#[derive(Debug, Clone, clap::Parser)]
pub struct DistributorConfig {
    /// Host to bind on.
    #[arg(long, default_value = "0.0.0.0", env = "CODEWELL_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8080, env = "CODEWELL_PORT")]
    pub port: u16,

    /// Path to the game catalog JSON file.
    #[arg(long, env = "CODEWELL_CATALOG")]
    pub catalog_path: PathBuf,

    /// Postgres connection string for the durable tier and user store.
    #[arg(long, env = "CODEWELL_DATABASE_URL")]
    pub database_url: String,

    /// Max Postgres connections held by this process.
    #[arg(long, default_value_t = 10, env = "CODEWELL_DB_MAX_CONNECTIONS")]
    pub db_max_connections: u32,

    /// Redis connection string for the warm tier.
    #[arg(long, env = "CODEWELL_REDIS_URL")]
    pub redis_url: String,

    /// Warm-tier bulk refill size.
    #[arg(long, default_value_t = codewell_inventory::inventory::DEFAULT_REFILL, env = "CODEWELL_WARM_REFILL")]
    pub warm_refill: u32,

    /// Warm-tier TTL in seconds.
    #[arg(long, default_value_t = codewell_inventory::inventory::DEFAULT_TTL_SECS, env = "CODEWELL_WARM_TTL_SECS")]
    pub warm_ttl_secs: u64,

    /// Default number of codes drawn per game on a grant.
    #[arg(long, default_value_t = 4, env = "CODEWELL_DRAW_DEFAULT")]
    pub draw_default: u32,

    /// Codes drawn for the catalog's boosted game.
    #[arg(long, default_value_t = 8, env = "CODEWELL_DRAW_BOOSTED")]
    pub draw_boosted: u32,
}
