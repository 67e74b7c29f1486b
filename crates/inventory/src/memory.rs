// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Codewell Contributors

//! In-memory fakes of [`DurableStore`] and [`WarmTier`] for unit tests.
//! These stand in for Postgres/Redis in every test that does not need
//! `tests/specs`'s real backing services.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::code::Code;
use crate::error::InventoryError;
use crate::traits::{DurableStore, WarmTier};

#[derive(Default)]
pub struct InMemoryDurableStore {
    partitions: Mutex<HashMap<String, Vec<Code>>>,
}

#[async_trait]
impl DurableStore for InMemoryDurableStore {
    async fn append(&self, game: &str, code: &Code) -> Result<(), InventoryError> {
        let mut partitions = self.partitions.lock().unwrap_or_else(|e| e.into_inner());
        let partition = partitions.entry(game.to_string()).or_default();
        if !partition.iter().any(|c| c.value == code.value) {
            partition.push(code.clone());
            partition.sort_by_key(|c| c.created_at);
        }
        Ok(())
    }

    async fn oldest(&self, game: &str, limit: u32) -> Result<Vec<Code>, InventoryError> {
        let partitions = self.partitions.lock().unwrap_or_else(|e| e.into_inner());
        Ok(partitions
            .get(game)
            .map(|codes| codes.iter().take(limit as usize).cloned().collect())
            .unwrap_or_default())
    }

    async fn remove(&self, game: &str, codes: &[String]) -> Result<(), InventoryError> {
        let mut partitions = self.partitions.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(partition) = partitions.get_mut(game) {
            partition.retain(|c| !codes.contains(&c.value));
        }
        Ok(())
    }

    async fn count(&self, game: &str) -> Result<u64, InventoryError> {
        let partitions = self.partitions.lock().unwrap_or_else(|e| e.into_inner());
        Ok(partitions.get(game).map(|p| p.len() as u64).unwrap_or(0))
    }
}

#[derive(Default)]
pub struct InMemoryWarmTier {
    lists: Mutex<HashMap<String, Vec<Code>>>,
}

#[async_trait]
impl WarmTier for InMemoryWarmTier {
    async fn is_empty(&self, game: &str) -> Result<bool, InventoryError> {
        let lists = self.lists.lock().unwrap_or_else(|e| e.into_inner());
        Ok(lists.get(game).map(|l| l.is_empty()).unwrap_or(true))
    }

    async fn refill(&self, game: &str, codes: &[Code], _ttl_secs: u64) -> Result<(), InventoryError> {
        let mut lists = self.lists.lock().unwrap_or_else(|e| e.into_inner());
        lists.insert(game.to_string(), codes.to_vec());
        Ok(())
    }

    async fn peek(&self, game: &str, n: u32) -> Result<Vec<Code>, InventoryError> {
        let lists = self.lists.lock().unwrap_or_else(|e| e.into_inner());
        Ok(lists.get(game).map(|l| l.iter().take(n as usize).cloned().collect()).unwrap_or_default())
    }

    async fn remove(&self, game: &str, codes: &[String]) -> Result<(), InventoryError> {
        let mut lists = self.lists.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(list) = lists.get_mut(game) {
            list.retain(|c| !codes.contains(&c.value));
        }
        Ok(())
    }
}
