// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Codewell Contributors

use std::fmt;

/// Failure kinds surfaced by the Inventory's two tiers.
#[derive(Debug)]
pub enum InventoryError {
    Durable(sqlx::Error),
    Warm(redis::RedisError),
    /// A game name not present in the catalog was used to address a partition.
    UnknownPartition(String),
}

impl fmt::Display for InventoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Durable(e) => write!(f, "durable tier error: {e}"),
            Self::Warm(e) => write!(f, "warm tier error: {e}"),
            Self::UnknownPartition(name) => write!(f, "unknown partition: {name}"),
        }
    }
}

impl std::error::Error for InventoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Durable(e) => Some(e),
            Self::Warm(e) => Some(e),
            Self::UnknownPartition(_) => None,
        }
    }
}

impl From<sqlx::Error> for InventoryError {
    fn from(e: sqlx::Error) -> Self {
        Self::Durable(e)
    }
}

impl From<redis::RedisError> for InventoryError {
    fn from(e: redis::RedisError) -> Self {
        Self::Warm(e)
    }
}
