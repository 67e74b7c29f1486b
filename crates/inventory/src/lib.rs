// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Codewell Contributors

//! The Code Inventory: the producer/consumer seam between the Harvester and
//! the Distributor. A durable tier (source of truth) sits behind a warm tier
//! (read cache), composed by [`Inventory`].

pub mod code;
pub mod error;
pub mod inventory;
pub mod memory;
pub mod postgres;
pub mod redis_tier;
pub mod traits;

pub use code::Code;
pub use error::InventoryError;
pub use inventory::Inventory;
pub use traits::{DurableStore, WarmTier};
