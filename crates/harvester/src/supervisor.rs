// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Codewell Contributors

use std::sync::Arc;
use std::time::Duration;

use codewell_core::{CoreError, GameCatalog, ProxyPool};
use codewell_inventory::Inventory;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::worker::Worker;

/// Cooldown between a worker crash and its restart.
const RESTART_COOLDOWN: Duration = Duration::from_secs(1);

/// Builds the worker fleet from a `(GameCatalog, ProxyPool)` assignment and
/// keeps it alive for the life of the process, restarting any worker that
/// exits with an error.
pub struct Supervisor {
    assignments: Vec<(codewell_core::GameSpec, codewell_core::ProxySpec)>,
    base_url: String,
    inventory: Arc<Inventory>,
    shutdown: CancellationToken,
}

impl Supervisor {
    pub fn new(
        catalog: GameCatalog,
        proxies: ProxyPool,
        inventory: Arc<Inventory>,
        shutdown: CancellationToken,
    ) -> Result<Self, CoreError> {
        Self::with_base_url(catalog, proxies, inventory, shutdown, "https://api.gamepromo.io".to_string())
    }

    pub fn with_base_url(
        catalog: GameCatalog,
        proxies: ProxyPool,
        inventory: Arc<Inventory>,
        shutdown: CancellationToken,
        base_url: String,
    ) -> Result<Self, CoreError> {
        let flattened = catalog.flatten();
        let assignments = proxies.assign_sequential(flattened.into_iter().map(|(g, _)| g).collect())?;
        Ok(Self { assignments, base_url, inventory, shutdown })
    }

    /// Spawn every worker in parallel and run until shutdown is signaled,
    /// restarting any worker that returns an error.
    pub async fn run(&self) -> anyhow::Result<()> {
        let mut handles: Vec<JoinHandle<()>> = Vec::with_capacity(self.assignments.len());

        for (game, proxy) in &self.assignments {
            let game = game.clone();
            let proxy = proxy.clone();
            let base_url = self.base_url.clone();
            let inventory = Arc::clone(&self.inventory);
            let shutdown = self.shutdown.clone();

            handles.push(tokio::spawn(async move {
                loop {
                    if shutdown.is_cancelled() {
                        return;
                    }
                    let worker = Worker::new(
                        game.clone(),
                        proxy.clone(),
                        base_url.clone(),
                        Arc::clone(&inventory),
                        shutdown.clone(),
                    );
                    match worker.run().await {
                        Ok(()) => return,
                        Err(e) => {
                            error!(game = %game.name, err = %e, "worker crashed, restarting");
                            tokio::select! {
                                () = tokio::time::sleep(RESTART_COOLDOWN) => {}
                                () = shutdown.cancelled() => return,
                            }
                        }
                    }
                }
            }));
        }

        info!(workers = handles.len(), "harvester fleet started");
        self.shutdown.cancelled().await;
        info!("shutdown signaled, waiting for workers to release their sessions");
        for handle in handles {
            let _ = handle.await;
        }
        Ok(())
    }
}
