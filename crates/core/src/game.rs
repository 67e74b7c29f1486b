// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Codewell Contributors

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Static, process-lifetime configuration for one game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSpec {
    /// Human label, also the inventory partition key.
    pub name: String,
    /// Opaque upstream credential.
    pub app_token: String,
    /// Opaque upstream credential.
    pub promo_id: String,
    /// Floor on inter-step and retry pacing, in seconds.
    pub base_delay_seconds: f64,
    /// Maximum `register-event` retries before the worker restarts the cycle.
    pub attempts: u32,
    /// Target number of concurrent Workers for this game.
    pub copies: u32,
    /// When set, this game draws `k_boosted` codes per issuance instead of
    /// the catalog-wide default `k`.
    #[serde(default)]
    pub boosted: bool,
}

/// The full set of games, loaded once at startup and treated as read-only
/// thereafter.
#[derive(Debug, Clone, Default)]
pub struct GameCatalog {
    games: Vec<GameSpec>,
}

impl GameCatalog {
    pub fn from_games(games: Vec<GameSpec>) -> Self {
        Self { games }
    }

    /// Load from a JSON file holding an array of `GameSpec`.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let contents = std::fs::read_to_string(path).map_err(|_| CoreError::InvalidConfig)?;
        let games: Vec<GameSpec> =
            serde_json::from_str(&contents).map_err(|_| CoreError::InvalidConfig)?;
        Ok(Self { games })
    }

    pub fn games(&self) -> &[GameSpec] {
        &self.games
    }

    pub fn get(&self, name: &str) -> Option<&GameSpec> {
        self.games.iter().find(|g| g.name == name)
    }

    /// Sum of `copies` across the catalog, the quantity checked against the
    /// proxy pool's size at startup.
    pub fn total_copies(&self) -> u32 {
        self.games.iter().map(|g| g.copies).sum()
    }

    /// Flatten into `(GameSpec, copy_index)` pairs in catalog order, the
    /// sequence the supervisor assigns proxies against.
    pub fn flatten(&self) -> Vec<(GameSpec, u32)> {
        let mut out = Vec::with_capacity(self.total_copies() as usize);
        for game in &self.games {
            for i in 0..game.copies {
                out.push((game.clone(), i));
            }
        }
        out
    }

    /// The single catalog-designated boosted game, if any.
    pub fn boosted_game(&self) -> Option<&GameSpec> {
        self.games.iter().find(|g| g.boosted)
    }

    pub fn as_map(&self) -> HashMap<String, GameSpec> {
        self.games.iter().map(|g| (g.name.clone(), g.clone())).collect()
    }
}
