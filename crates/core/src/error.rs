// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Codewell Contributors

use std::fmt;

/// Error kinds shared by every crate in the workspace.
///
/// A small closed enum with a machine code rather than a `thiserror`-derived
/// tree, since every variant here maps to an operator-facing condition
/// rather than a wrapped library error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreError {
    /// `Σ copies > |proxies|` at startup.
    ProxyPoolExhausted,
    /// The catalog or proxy file failed to parse.
    InvalidConfig,
    /// A game name was referenced that is not in the catalog.
    UnknownGame,
}

impl CoreError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProxyPoolExhausted => "PROXY_POOL_EXHAUSTED",
            Self::InvalidConfig => "INVALID_CONFIG",
            Self::UnknownGame => "UNKNOWN_GAME",
        }
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::error::Error for CoreError {}
