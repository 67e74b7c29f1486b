// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Codewell Contributors

use async_trait::async_trait;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};

use crate::code::Code;
use crate::error::InventoryError;
use crate::traits::WarmTier;

/// Redis-backed warm tier: one ordered list per game at key `keys:<game>`.
pub struct RedisWarmTier {
    manager: redis::aio::ConnectionManager,
}

impl RedisWarmTier {
    pub fn new(manager: redis::aio::ConnectionManager) -> Self {
        Self { manager }
    }

    fn key(game: &str) -> String {
        format!("keys:{game}")
    }
}

/// Serialized list-element shape: the code value and its creation timestamp,
/// so ordering survives a warm-tier reload without a round trip to Postgres.
#[derive(Serialize, Deserialize)]
struct Entry {
    value: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<&Code> for Entry {
    fn from(code: &Code) -> Self {
        Self { value: code.value.clone(), created_at: code.created_at }
    }
}

impl From<Entry> for Code {
    fn from(entry: Entry) -> Self {
        Code::new(entry.value, entry.created_at)
    }
}

#[async_trait]
impl WarmTier for RedisWarmTier {
    async fn is_empty(&self, game: &str) -> Result<bool, InventoryError> {
        let mut conn = self.manager.clone();
        let len: i64 = conn.llen(Self::key(game)).await?;
        Ok(len <= 0)
    }

    async fn refill(&self, game: &str, codes: &[Code], ttl_secs: u64) -> Result<(), InventoryError> {
        let key = Self::key(game);
        let mut conn = self.manager.clone();
        let _: () = conn.del(&key).await?;
        if codes.is_empty() {
            return Ok(());
        }
        let serialized: Vec<String> = codes
            .iter()
            .map(Entry::from)
            .map(|e| serde_json::to_string(&e).unwrap_or_default())
            .collect();
        let _: () = conn.rpush(&key, serialized).await?;
        let _: () = conn.expire(&key, ttl_secs as i64).await?;
        Ok(())
    }

    async fn peek(&self, game: &str, n: u32) -> Result<Vec<Code>, InventoryError> {
        if n == 0 {
            return Ok(Vec::new());
        }
        let mut conn = self.manager.clone();
        let raw: Vec<String> = conn.lrange(Self::key(game), 0, i64::from(n) - 1).await?;
        Ok(raw
            .into_iter()
            .filter_map(|s| serde_json::from_str::<Entry>(&s).ok())
            .map(Code::from)
            .collect())
    }

    async fn remove(&self, game: &str, codes: &[String]) -> Result<(), InventoryError> {
        if codes.is_empty() {
            return Ok(());
        }
        let mut conn = self.manager.clone();
        let key = Self::key(game);
        // List entries are serialized Entry JSON, not bare values, so removal
        // has to fetch-then-match rather than LREM on the raw code string.
        let raw: Vec<String> = conn.lrange(&key, 0, -1).await?;
        for s in raw {
            let matches = serde_json::from_str::<Entry>(&s)
                .map(|e| codes.contains(&e.value))
                .unwrap_or(false);
            if matches {
                let _: i64 = conn.lrem(&key, 1, &s).await?;
            }
        }
        Ok(())
    }
}
