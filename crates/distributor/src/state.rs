// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Codewell Contributors

use std::sync::Arc;

use codewell_core::GameCatalog;
use codewell_inventory::Inventory;

use crate::issuance::IssuanceEngine;
use crate::users::UserStore;

/// Shared application state threaded through every handler via axum's
/// `State` extractor.
pub struct AppState {
    pub catalog: GameCatalog,
    pub inventory: Arc<Inventory>,
    pub users: Arc<dyn UserStore>,
    pub issuance: IssuanceEngine,
}
