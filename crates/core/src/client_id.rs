// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Codewell Contributors

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;

/// An ephemeral per-login identifier: `<ms_epoch>-<19 decimal digits>`.
///
/// Never persisted; regenerated once per worker cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientId(String);

impl ClientId {
    /// Generate a new id from the current wall clock and a random 19-digit tail.
    pub fn generate() -> Self {
        let ms = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis()).unwrap_or(0);
        let tail: u64 = rand::rng().random_range(0..=9_999_999_999_999_999_999u64);
        Self(format!("{ms}-{tail:019}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_well_formed_id() {
        let id = ClientId::generate();
        let s = id.as_str();
        let (epoch, tail) = s.split_once('-').expect("id must contain a dash");
        assert!(epoch.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(tail.len(), 19);
        assert!(tail.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn successive_ids_differ() {
        let a = ClientId::generate();
        let b = ClientId::generate();
        assert_ne!(a, b);
    }
}
