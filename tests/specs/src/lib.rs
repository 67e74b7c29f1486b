// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Codewell Contributors

//! Test harness for end-to-end binary smoke tests against a live
//! Postgres + Redis pair.
//!
//! Spawns the real `distributor` binary as a subprocess and exercises it
//! over HTTP. Gated behind `CODEWELL_TEST_DATABASE_URL`; see
//! [`test_backends`].

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::Once;
use std::time::Duration;

static CRYPTO_INIT: Once = Once::new();

/// Install the ring crypto provider for reqwest/rustls.
/// Safe to call multiple times — only the first call has effect.
pub fn ensure_crypto() {
    CRYPTO_INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Connection strings for a live test backend, read from the environment.
/// Tests that need real Postgres/Redis should call this and return early
/// (treating the scenario as skipped, not failed) when it is `None`.
pub struct TestBackends {
    pub database_url: String,
    pub redis_url: String,
}

/// `None` unless both `CODEWELL_TEST_DATABASE_URL` and `CODEWELL_TEST_REDIS_URL`
/// are set.
pub fn test_backends() -> Option<TestBackends> {
    let database_url = std::env::var("CODEWELL_TEST_DATABASE_URL").ok()?;
    let redis_url = std::env::var("CODEWELL_TEST_REDIS_URL").ok()?;
    Some(TestBackends { database_url, redis_url })
}

/// Resolve the path to the compiled `distributor` binary.
pub fn distributor_binary() -> PathBuf {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    // tests/specs -> tests -> workspace root
    let workspace = manifest.parent().and_then(|p| p.parent()).unwrap_or(manifest);
    workspace.join("target").join("debug").join("distributor")
}

/// Find a free TCP port by binding to :0 then releasing.
pub fn free_port() -> anyhow::Result<u16> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}

/// Write a minimal one-game catalog fixture and return its path (kept alive
/// by the returned `TempDir`).
pub fn sample_catalog(game_name: &str, boosted: bool) -> anyhow::Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("catalog.json");
    let body = serde_json::json!([{
        "name": game_name,
        "app_token": "test-app-token",
        "promo_id": "test-promo-id",
        "base_delay_seconds": 1.0,
        "attempts": 5,
        "copies": 1,
        "boosted": boosted,
    }]);
    std::fs::write(&path, serde_json::to_vec(&body)?)?;
    Ok((dir, path))
}

/// A running `distributor` process that is killed on drop.
pub struct DistributorProcess {
    child: Child,
    port: u16,
    _catalog_dir: tempfile::TempDir,
}

impl DistributorProcess {
    /// Spawn `distributor` against the given backends and a single-game
    /// catalog, waiting is the caller's responsibility via [`Self::wait_healthy`].
    pub fn start(backends: &TestBackends, game_name: &str, boosted: bool) -> anyhow::Result<Self> {
        ensure_crypto();
        let binary = distributor_binary();
        anyhow::ensure!(binary.exists(), "distributor binary not found at {}", binary.display());

        let port = free_port()?;
        let (catalog_dir, catalog_path) = sample_catalog(game_name, boosted)?;

        let child = Command::new(&binary)
            .args([
                "--host",
                "127.0.0.1",
                "--port",
                &port.to_string(),
                "--catalog-path",
                &catalog_path.to_string_lossy(),
                "--database-url",
                &backends.database_url,
                "--redis-url",
                &backends.redis_url,
            ])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        Ok(Self { child, port, _catalog_dir: catalog_dir })
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Poll `/v1/health` until responsive.
    pub async fn wait_healthy(&self, timeout: Duration) -> anyhow::Result<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        let client = reqwest::Client::new();
        let url = format!("{}/v1/health", self.base_url());
        loop {
            if tokio::time::Instant::now() > deadline {
                anyhow::bail!("distributor did not become healthy within {timeout:?}");
            }
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status().is_success() {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
}

impl Drop for DistributorProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
