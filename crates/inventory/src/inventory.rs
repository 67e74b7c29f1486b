// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Codewell Contributors

use std::sync::Arc;

use tracing::warn;

use crate::code::Code;
use crate::error::InventoryError;
use crate::traits::{DurableStore, WarmTier};

/// Default bulk refill size: how many codes to pull from the durable tier
/// into the warm tier on a cache miss.
pub const DEFAULT_REFILL: u32 = 2000;
/// Default warm-tier TTL in seconds.
pub const DEFAULT_TTL_SECS: u64 = 7200;

/// The code inventory: a durable tier behind a lazily-materialized warm
/// tier. Producers (workers) call [`Inventory::append`]; consumers (the
/// issuance engine) call [`Inventory::peek_oldest`] then
/// [`Inventory::remove`].
pub struct Inventory {
    durable: Arc<dyn DurableStore>,
    warm: Arc<dyn WarmTier>,
    refill_size: u32,
    ttl_secs: u64,
}

impl Inventory {
    pub fn new(durable: Arc<dyn DurableStore>, warm: Arc<dyn WarmTier>) -> Self {
        Self { durable, warm, refill_size: DEFAULT_REFILL, ttl_secs: DEFAULT_TTL_SECS }
    }

    pub fn with_refill(mut self, refill_size: u32, ttl_secs: u64) -> Self {
        self.refill_size = refill_size;
        self.ttl_secs = ttl_secs;
        self
    }

    /// Write through to the durable tier only; the warm tier is left to a
    /// subsequent consumer refresh.
    pub async fn append(&self, game: &str, code: Code) -> Result<(), InventoryError> {
        self.durable.append(game, &code).await
    }

    /// Up to `n` codes in creation order, without removing them. Refills the
    /// warm tier from the durable tier first if it is currently empty.
    pub async fn peek_oldest(&self, game: &str, n: u32) -> Result<Vec<Code>, InventoryError> {
        if self.warm.is_empty(game).await? {
            let batch = self.durable.oldest(game, self.refill_size).await?;
            self.warm.refill(game, &batch, self.ttl_secs).await?;
        }
        self.warm.peek(game, n).await
    }

    /// Remove by value from the warm tier only, leaving the durable tier
    /// untouched. Used by callers that need to fold the durable removal into
    /// a transaction of their own (the issuance engine's commit step).
    pub async fn remove_warm_only(&self, game: &str, codes: &[String]) -> Result<(), InventoryError> {
        self.warm.remove(game, codes).await
    }

    /// Remove by value from both tiers. From the caller's perspective this is
    /// atomic: once `remove` returns, no subsequent `peek_oldest` observes
    /// these codes again.
    pub async fn remove(&self, game: &str, codes: &[String]) -> Result<(), InventoryError> {
        self.durable.remove(game, codes).await?;
        if let Err(e) = self.warm.remove(game, codes).await {
            warn!(game, err = %e, "warm-tier remove failed after durable remove succeeded");
            return Err(e);
        }
        Ok(())
    }

    /// Re-add previously-removed codes to the warm tier, used by the
    /// issuance engine's commit-failure rollback path.
    pub async fn readd_to_warm(&self, game: &str, codes: &[Code]) -> Result<(), InventoryError> {
        // `refill` replaces the list outright, so merge with whatever is
        // already cached rather than clobbering it.
        let existing = self.warm.peek(game, u32::MAX).await.unwrap_or_default();
        let mut merged = codes.to_vec();
        merged.extend(existing);
        merged.sort_by_key(|c| c.created_at);
        self.warm.refill(game, &merged, self.ttl_secs).await
    }

    pub async fn count(&self, game: &str) -> Result<u64, InventoryError> {
        self.durable.count(game).await
    }
}
