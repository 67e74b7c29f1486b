// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Codewell Contributors

//! Shared domain types for the promo-code harvesting and distribution service:
//! the game catalog, the proxy pool, user records, and the error taxonomy.

pub mod client_id;
pub mod error;
pub mod game;
pub mod limits;
pub mod proxy;
pub mod user;

pub use client_id::ClientId;
pub use error::CoreError;
pub use game::{GameCatalog, GameSpec};
pub use limits::{StatusLimits, StatusLimitsTable};
pub use proxy::{ProxyPool, ProxySpec};
pub use user::{Role, Status, UserRecord};
