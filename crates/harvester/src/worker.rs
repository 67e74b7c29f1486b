// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Codewell Contributors

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use codewell_core::{ClientId, GameSpec, ProxySpec};
use codewell_inventory::{Code, Inventory};
use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::client::{PromoClient, PromoResponse};

/// Per-call timeout floor; minting gets the longer of the two since the
/// upstream is considered to owe the code once `hasCode` fires.
const LOGIN_TIMEOUT: Duration = Duration::from_secs(20);
const MINT_TIMEOUT: Duration = Duration::from_secs(30);

/// A single promo-generation loop: one proxy slot, one HTTP session, one
/// in-flight token.
pub struct Worker {
    game: GameSpec,
    proxy: ProxySpec,
    base_url: String,
    inventory: Arc<Inventory>,
    shutdown: CancellationToken,
}

impl Worker {
    pub fn new(
        game: GameSpec,
        proxy: ProxySpec,
        base_url: String,
        inventory: Arc<Inventory>,
        shutdown: CancellationToken,
    ) -> Self {
        Self { game, proxy, base_url, inventory, shutdown }
    }

    /// Run cycles until the supervisor cancels this worker. Returns `Ok(())`
    /// only on cancellation; every cycle-level fault is swallowed internally
    /// and retried, so a returned `Err` here means something unrecoverable
    /// happened at the client-construction level, which the supervisor
    /// treats as a crash to restart.
    pub async fn run(self) -> anyhow::Result<()> {
        loop {
            if self.shutdown.is_cancelled() {
                return Ok(());
            }
            self.cycle().await;
        }
    }

    /// One LoggingIn → Emulating → Minting → Persisting → Idle traversal.
    /// Never returns early on a recoverable fault; only cancellation
    /// short-circuits it.
    async fn cycle(&self) {
        let client = match PromoClient::new(&self.base_url, &self.proxy, LOGIN_TIMEOUT) {
            Ok(c) => c,
            Err(e) => {
                warn!(game = %self.game.name, err = %e, "failed to build http client, retrying");
                self.sleep(Duration::from_secs(5)).await;
                return;
            }
        };

        let Some(client_token) = self.login(&client).await else { return };
        let Some(()) = self.emulate(&client, &client_token).await else { return };
        let Some(promo_code) = self.mint(&client, &client_token).await else { return };
        self.persist(&promo_code).await;
        self.idle().await;
    }

    /// LoggingIn. Unbounded retries on any failure. Returns `None` only if
    /// cancelled mid-retry.
    async fn login(&self, client: &PromoClient) -> Option<String> {
        loop {
            let client_id = ClientId::generate();
            match client.login_client(&self.game.app_token, client_id.as_str()).await {
                PromoResponse::Ok(resp) if !resp.client_token.is_empty() => return Some(resp.client_token),
                _ => {
                    debug!(game = %self.game.name, "login-client failed, retrying");
                    let delay = self.game.base_delay_seconds + jitter(0.1, 3.0) + 6.0;
                    if self.sleep(secs(delay)).await {
                        return None;
                    }
                }
            }
        }
    }

    /// Emulating. Up to `attempts` register-event round trips.
    async fn emulate(&self, client: &PromoClient, client_token: &str) -> Option<()> {
        for _ in 0..self.game.attempts {
            let event_id = Uuid::new_v4().to_string();
            match client.register_event(&self.game.promo_id, &event_id, client_token).await {
                PromoResponse::Ok(resp) if resp.has_code => return Some(()),
                PromoResponse::TooManyRegister => {
                    let delay = self.game.base_delay_seconds + jitter(5.0, 25.0) + jitter(1.0, 3.0);
                    if self.sleep(secs(delay)).await {
                        return None;
                    }
                }
                PromoResponse::Html => {
                    debug!(game = %self.game.name, "register-event returned html, treating as transient");
                }
                _ => {
                    if self.sleep(secs(jitter(3.0, 6.0))).await {
                        return None;
                    }
                }
            }
        }
        None
    }

    /// Minting. Unbounded retry until a non-empty `promoCode` is observed —
    /// this step never gives up.
    async fn mint(&self, client: &PromoClient, client_token: &str) -> Option<String> {
        loop {
            match client.create_code(&self.game.promo_id, client_token).await {
                PromoResponse::Ok(resp) if !resp.promo_code.is_empty() => return Some(resp.promo_code),
                _ => {
                    if self.sleep(secs(jitter(1.0, 3.5))).await {
                        return None;
                    }
                }
            }
        }
    }

    /// Persisting. A durable-store failure is logged and the code is
    /// dropped; it is never retried.
    async fn persist(&self, promo_code: &str) {
        let code = Code::new(promo_code, Utc::now());
        if let Err(e) = self.inventory.append(&self.game.name, code).await {
            warn!(game = %self.game.name, err = %e, "dropping minted code after durable append failure");
        }
    }

    /// Idle. Sleep then loop back to LoggingIn.
    async fn idle(&self) {
        self.sleep(secs(jitter(0.1, 3.0) + 1.0)).await;
    }

    /// Sleep for `dur`, waking early on cancellation. Returns `true` if the
    /// sleep was cut short by shutdown.
    async fn sleep(&self, dur: Duration) -> bool {
        tokio::select! {
            () = tokio::time::sleep(dur) => false,
            () = self.shutdown.cancelled() => true,
        }
    }
}

fn jitter(lo: f64, hi: f64) -> f64 {
    rand::rng().random_range(lo..hi)
}

fn secs(value: f64) -> Duration {
    Duration::from_secs_f64(value.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn jitter_stays_within_bounds(lo in 0.0f64..10.0, span in 0.01f64..20.0) {
            let hi = lo + span;
            let value = jitter(lo, hi);
            prop_assert!(value >= lo && value < hi);
        }

        #[test]
        fn secs_never_produces_a_negative_duration(value in -100.0f64..100.0) {
            let d = secs(value);
            prop_assert!(d.as_secs_f64() >= 0.0);
        }
    }
}
