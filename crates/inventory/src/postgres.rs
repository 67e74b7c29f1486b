// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Codewell Contributors

use async_trait::async_trait;
use sqlx::PgPool;

use crate::code::Code;
use crate::error::InventoryError;
use crate::traits::DurableStore;

/// Postgres-backed durable tier.
///
/// One partitioned table rather than one table per game:
/// `promo_codes(id, game, promo_code, created_at)` with a unique index on
/// `(game, promo_code)` and a secondary index on `(game, created_at)`. See
/// `migrations/` in the distributor crate.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DurableStore for PostgresStore {
    async fn append(&self, game: &str, code: &Code) -> Result<(), InventoryError> {
        sqlx::query(
            "INSERT INTO promo_codes (game, promo_code, created_at) VALUES ($1, $2, $3) \
             ON CONFLICT (game, promo_code) DO NOTHING",
        )
        .bind(game)
        .bind(&code.value)
        .bind(code.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn oldest(&self, game: &str, limit: u32) -> Result<Vec<Code>, InventoryError> {
        let rows: Vec<(String, chrono::DateTime<chrono::Utc>)> = sqlx::query_as(
            "SELECT promo_code, created_at FROM promo_codes \
             WHERE game = $1 ORDER BY created_at ASC LIMIT $2",
        )
        .bind(game)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(value, created_at)| Code::new(value, created_at)).collect())
    }

    async fn remove(&self, game: &str, codes: &[String]) -> Result<(), InventoryError> {
        if codes.is_empty() {
            return Ok(());
        }
        sqlx::query("DELETE FROM promo_codes WHERE game = $1 AND promo_code = ANY($2)")
            .bind(game)
            .bind(codes)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn count(&self, game: &str) -> Result<u64, InventoryError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM promo_codes WHERE game = $1")
                .bind(game)
                .fetch_one(&self.pool)
                .await?;
        Ok(count.max(0) as u64)
    }
}
