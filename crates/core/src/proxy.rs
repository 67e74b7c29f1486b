// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Codewell Contributors

use std::path::Path;

use crate::error::CoreError;

/// A proxy URL with optional embedded `user:pass` credentials.
///
/// Invariant: bound to at most one worker at a time; the pool hands out each
/// entry exactly once, by index, and never rebinds at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxySpec {
    raw: String,
}

impl ProxySpec {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// The full `scheme://[user:pass@]host:port` string, suitable for
    /// `reqwest::Proxy::all`.
    pub fn url(&self) -> &str {
        &self.raw
    }
}

/// The fixed list of outbound egresses.
#[derive(Debug, Clone, Default)]
pub struct ProxyPool {
    proxies: Vec<ProxySpec>,
}

impl ProxyPool {
    pub fn from_proxies(proxies: Vec<ProxySpec>) -> Self {
        Self { proxies }
    }

    /// Load one proxy per non-empty, non-comment line.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let contents = std::fs::read_to_string(path).map_err(|_| CoreError::InvalidConfig)?;
        let proxies = contents
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(ProxySpec::new)
            .collect();
        Ok(Self { proxies })
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ProxySpec> {
        self.proxies.get(index)
    }

    /// Assign one proxy per flattened `(GameSpec, copy_index)` entry by
    /// sequential index, failing fast if the catalog demands more workers
    /// than there are proxies.
    pub fn assign_sequential<T>(&self, flattened: Vec<T>) -> Result<Vec<(T, ProxySpec)>, CoreError> {
        if flattened.len() > self.proxies.len() {
            return Err(CoreError::ProxyPoolExhausted);
        }
        Ok(flattened.into_iter().zip(self.proxies.iter().cloned()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assign_sequential_fails_fast_when_undersized() {
        let pool = ProxyPool::from_proxies(vec![ProxySpec::new("http://a:1"), ProxySpec::new("http://b:1")]);
        let flattened = vec!["w0", "w1", "w2"];
        let err = pool.assign_sequential(flattened).unwrap_err();
        assert_eq!(err, CoreError::ProxyPoolExhausted);
    }

    #[test]
    fn assign_sequential_succeeds_when_exact() {
        let pool = ProxyPool::from_proxies(vec![ProxySpec::new("http://a:1"), ProxySpec::new("http://b:1")]);
        let assigned = pool.assign_sequential(vec!["w0", "w1"]).expect("should fit");
        assert_eq!(assigned.len(), 2);
        assert_eq!(assigned[0].1.url(), "http://a:1");
    }

    #[test]
    fn load_skips_blank_and_comment_lines() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("proxies.txt");
        std::fs::write(&path, "# header\nhttp://a:1\n\nhttp://b:1\n").expect("write fixture");
        let pool = ProxyPool::load(&path).expect("load");
        assert_eq!(pool.len(), 2);
    }
}
