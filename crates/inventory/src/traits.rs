// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Codewell Contributors

use async_trait::async_trait;

use crate::code::Code;
use crate::error::InventoryError;

/// The source of truth for minted codes.
///
/// A code visible through `peek` on the warm tier must be able to survive a
/// process restart — that durability lives here, not in the warm tier.
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Persist one minted code. Must be safe to call concurrently with other
    /// `append`s for the same or a different game.
    async fn append(&self, game: &str, code: &Code) -> Result<(), InventoryError>;

    /// The oldest `limit` codes for `game`, ordered by `created_at` ascending,
    /// used to refill the warm tier.
    async fn oldest(&self, game: &str, limit: u32) -> Result<Vec<Code>, InventoryError>;

    /// Remove the named codes from the durable store. Idempotent: removing an
    /// already-removed code is not an error.
    async fn remove(&self, game: &str, codes: &[String]) -> Result<(), InventoryError>;

    /// Best-effort row count for operator dashboards.
    async fn count(&self, game: &str) -> Result<u64, InventoryError>;
}

/// The in-memory read cache placed in front of the durable tier.
#[async_trait]
pub trait WarmTier: Send + Sync {
    /// `true` if the warm tier currently holds no entries for `game` — the
    /// signal that triggers a refill from the durable tier.
    async fn is_empty(&self, game: &str) -> Result<bool, InventoryError>;

    /// Bulk-load a freshly-fetched batch, oldest first, replacing whatever was
    /// there (a refill only ever follows an empty read, so there is nothing to
    /// merge with).
    async fn refill(&self, game: &str, codes: &[Code], ttl_secs: u64) -> Result<(), InventoryError>;

    /// Up to `n` codes in existing order, without removing them. Must never
    /// mutate the underlying store.
    async fn peek(&self, game: &str, n: u32) -> Result<Vec<Code>, InventoryError>;

    /// Remove the named codes. Idempotent.
    async fn remove(&self, game: &str, codes: &[String]) -> Result<(), InventoryError>;
}
