// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Codewell Contributors

use std::path::PathBuf;

/// Harvester process configuration. Every field accepts a CLI flag or an
/// environment-variable fallback.
#[derive(Debug, Clone, clap::Parser)]
pub struct HarvesterConfig {
    /// Path to the game catalog JSON file.
    #[arg(long, env = "CODEWELL_CATALOG")]
    pub catalog_path: PathBuf,

    /// Path to the flat proxy list file.
    #[arg(long, env = "CODEWELL_PROXIES")]
    pub proxy_list_path: PathBuf,

    /// Postgres connection string for the durable tier.
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

    /// Base URL for the upstream promo API (overridable for testing).
    #[arg(
        long,
        default_value = "https://api.gamepromo.io",
        env = "CODEWELL_UPSTREAM_BASE_URL"
    )]
    pub upstream_base_url: String,
}
