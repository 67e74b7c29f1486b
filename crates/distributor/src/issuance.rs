// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Codewell Contributors

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use codewell_core::{GameCatalog, StatusLimitsTable};
use codewell_inventory::Inventory;
use sqlx::PgPool;
use tracing::warn;

use crate::users::{InMemoryUserStore, UserStore};

/// One game's draw within a [`Outcome::Granted`] response.
#[derive(Debug, Clone)]
pub struct GameDraw {
    pub game: String,
    pub codes: Vec<String>,
}

/// The three categorical outcomes the issuance engine surfaces, plus the
/// ban gate handled before entry.
#[derive(Debug, Clone)]
pub enum Outcome {
    Granted(Vec<GameDraw>),
    Wait { remaining: chrono::Duration },
    LimitReached,
    Banned,
}

/// Issuance-path failure kinds. Each variant maps to an HTTP status and a
/// stable machine-readable code, the same shape as [`crate::error::ApiError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssuanceError {
    /// The given `user_id` has no row in the user store.
    UnknownUser,
    /// A store operation failed; the message is the underlying error text.
    Internal(String),
}

impl IssuanceError {
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::UnknownUser => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownUser => "UNKNOWN_USER",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

impl fmt::Display for IssuanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownUser => f.write_str("unknown user"),
            Self::Internal(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for IssuanceError {}

/// The atomic seam spanning the durable code removal and the user counter
/// update. The warm-tier removal happens outside this boundary since it
/// lives in a different store (Redis) that cannot co-transact with
/// Postgres; on failure here the caller re-adds the drawn codes to the
/// warm tier.
#[async_trait]
pub trait QuotaCommit: Send + Sync {
    async fn commit(
        &self,
        user_id: i64,
        removals: &[(String, Vec<String>)],
        codes_drawn: u64,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()>;
}

pub struct PostgresQuotaCommit {
    pool: PgPool,
}

impl PostgresQuotaCommit {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuotaCommit for PostgresQuotaCommit {
    async fn commit(
        &self,
        user_id: i64,
        removals: &[(String, Vec<String>)],
        codes_drawn: u64,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        for (game, codes) in removals {
            if codes.is_empty() {
                continue;
            }
            sqlx::query("DELETE FROM promo_codes WHERE game = $1 AND promo_code = ANY($2)")
                .bind(game)
                .bind(codes)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(
            "UPDATE users SET daily_request_count = daily_request_count + 1, \
             total_keys_generated = total_keys_generated + $1, last_request_time = $2 \
             WHERE user_id = $3",
        )
        .bind(codes_drawn as i64)
        .bind(now)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

/// Test double sharing an [`InMemoryUserStore`] with the plain read path,
/// with a fault-injection switch for exercising the rollback path.
pub struct InMemoryQuotaCommit {
    users: Arc<InMemoryUserStore>,
    fail: Arc<crate::users::FailSwitch>,
}

impl InMemoryQuotaCommit {
    pub fn new(users: Arc<InMemoryUserStore>, fail: Arc<crate::users::FailSwitch>) -> Self {
        Self { users, fail }
    }
}

#[async_trait]
impl QuotaCommit for InMemoryQuotaCommit {
    async fn commit(
        &self,
        user_id: i64,
        _removals: &[(String, Vec<String>)],
        codes_drawn: u64,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        if self.fail.get() {
            anyhow::bail!("injected commit failure");
        }
        self.users.apply_consume(user_id, codes_drawn, now)
    }
}

/// On a user request, issue exactly `k` codes per game atomically with the
/// per-user quota update, or reject.
pub struct IssuanceEngine {
    catalog: GameCatalog,
    inventory: Arc<Inventory>,
    users: Arc<dyn UserStore>,
    commit: Arc<dyn QuotaCommit>,
    limits: StatusLimitsTable,
    draw_default: u32,
    draw_boosted: u32,
}

impl IssuanceEngine {
    pub fn new(
        catalog: GameCatalog,
        inventory: Arc<Inventory>,
        users: Arc<dyn UserStore>,
        commit: Arc<dyn QuotaCommit>,
        limits: StatusLimitsTable,
        draw_default: u32,
        draw_boosted: u32,
    ) -> Self {
        Self { catalog, inventory, users, commit, limits, draw_default, draw_boosted }
    }

    fn draw_count(&self, game: &str) -> u32 {
        match self.catalog.get(game) {
            Some(spec) if spec.boosted => self.draw_boosted,
            _ => self.draw_default,
        }
    }

    /// Run the decision procedure for `(user_id, game_list)`: ban gate, daily
    /// reset, quota/interval checks, then an atomic draw-and-commit.
    pub async fn issue(&self, user_id: i64, game_list: &[String]) -> Result<Outcome, IssuanceError> {
        let Some(mut user) = self.users.get_user(user_id).await.map_err(|e| IssuanceError::Internal(e.to_string()))?
        else {
            return Err(IssuanceError::UnknownUser);
        };

        // Step 1: ban gate.
        if user.is_banned {
            return Ok(Outcome::Banned);
        }

        // Step 2: daily reset.
        let today = Utc::now().date_naive();
        if user.needs_daily_reset(today) {
            self.users
                .reset_daily(user_id, today)
                .await
                .map_err(|e| IssuanceError::Internal(e.to_string()))?;
            user.daily_request_count = 0;
            user.last_reset_date = today;
        }

        // Admins bypass quota and interval but still draw through the same
        // remove/commit path.
        let is_admin = matches!(user.role, codewell_core::Role::Admin);

        if !is_admin {
            // Step 3: quota check.
            let limits = self.limits.get(user.status);
            if user.daily_request_count >= limits.daily_limit {
                return Ok(Outcome::LimitReached);
            }

            // Step 4: interval check. A request at exactly the interval
            // boundary is allowed, so this is a strict `<`, not `<=`.
            if let Some(last) = user.last_request_time {
                let now = Utc::now();
                let elapsed = now - last;
                let required = chrono::Duration::minutes(limits.interval_minutes);
                if elapsed < required {
                    return Ok(Outcome::Wait { remaining: required - elapsed });
                }
            }
        }

        // Step 5: draw.
        let mut draws = Vec::with_capacity(game_list.len());
        let mut removals = Vec::with_capacity(game_list.len());
        let mut total_drawn: u64 = 0;

        for game in game_list {
            let k = self.draw_count(game);
            let codes =
                self.inventory.peek_oldest(game, k).await.map_err(|e| IssuanceError::Internal(e.to_string()))?;
            let values: Vec<String> = codes.iter().map(|c| c.value.clone()).collect();

            // Remove from the warm tier now; the durable removal happens
            // inside the atomic commit step below.
            self.inventory
                .remove_warm_only(game, &values)
                .await
                .map_err(|e| IssuanceError::Internal(e.to_string()))?;

            total_drawn += values.len() as u64;
            removals.push((game.clone(), values));
            draws.push(GameDraw { game: game.clone(), codes });
        }

        // Step 6: commit.
        let now = Utc::now();
        if let Err(e) = self.commit.commit(user_id, &removals, total_drawn, now).await {
            warn!(user_id, err = %e, "issuance commit failed, restoring warm-tier visibility");
            for draw in &draws {
                if let Err(readd_err) = self.inventory.readd_to_warm(&draw.game, &draw.codes).await {
                    warn!(user_id, game = %draw.game, err = %readd_err, "failed to restore warm tier after commit failure");
                }
            }
            return Err(IssuanceError::Internal(format!("issuance commit failed: {e}")));
        }

        Ok(Outcome::Granted(draws))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::FailSwitch;
    use chrono::NaiveDate;
    use codewell_core::{GameSpec, Role, Status, UserRecord};
    use codewell_inventory::memory::{InMemoryDurableStore, InMemoryWarmTier};
    use codewell_inventory::Code;

    fn game(name: &str, boosted: bool) -> GameSpec {
        GameSpec {
            name: name.to_string(),
            app_token: "t".to_string(),
            promo_id: "p".to_string(),
            base_delay_seconds: 1.0,
            attempts: 5,
            copies: 1,
            boosted,
        }
    }

    fn user(user_id: i64, status: Status, daily_request_count: u32, last_request_time: Option<DateTime<Utc>>) -> UserRecord {
        UserRecord {
            user_id,
            chat_id: user_id,
            language: "en".to_string(),
            first_name: None,
            last_name: None,
            username: None,
            status,
            daily_request_count,
            last_reset_date: Utc::now().date_naive(),
            last_request_time,
            total_keys_generated: 0,
            is_banned: false,
            role: Role::User,
            notes: None,
            created_at: Utc::now(),
        }
    }

    async fn seeded_inventory(game_name: &str, count: usize) -> Arc<Inventory> {
        let durable = Arc::new(InMemoryDurableStore::default());
        let warm = Arc::new(InMemoryWarmTier::default());
        let inventory = Arc::new(Inventory::new(durable, warm));
        for i in 0..count {
            inventory
                .append(game_name, Code::new(format!("code-{i}"), Utc::now()))
                .await
                .expect("seed code");
        }
        inventory
    }

    fn engine(
        catalog: GameCatalog,
        inventory: Arc<Inventory>,
        users: Arc<InMemoryUserStore>,
        fail: Arc<FailSwitch>,
    ) -> IssuanceEngine {
        let commit = Arc::new(InMemoryQuotaCommit::new(Arc::clone(&users), fail));
        IssuanceEngine::new(
            catalog,
            inventory,
            users,
            commit,
            StatusLimitsTable::default(),
            4,
            8,
        )
    }

    #[tokio::test]
    async fn grants_and_charges_one_quota_point_even_with_empty_partition() {
        let catalog = GameCatalog::from_games(vec![game("astro", false)]);
        let inventory = seeded_inventory("astro", 0).await;
        let users = Arc::new(InMemoryUserStore::default());
        users.seed(user(1, Status::Free, 0, None));
        let eng = engine(catalog, inventory, Arc::clone(&users), Arc::new(FailSwitch::default()));

        let outcome = eng.issue(1, &["astro".to_string()]).await.expect("issue");
        match outcome {
            Outcome::Granted(draws) => assert!(draws[0].codes.is_empty()),
            other => panic!("expected Granted, got {other:?}"),
        }

        let after = users.get_user(1).await.expect("get").expect("present");
        assert_eq!(after.daily_request_count, 1);
    }

    #[tokio::test]
    async fn limit_reached_stops_the_request() {
        let catalog = GameCatalog::from_games(vec![game("astro", false)]);
        let inventory = seeded_inventory("astro", 10).await;
        let users = Arc::new(InMemoryUserStore::default());
        users.seed(user(1, Status::Free, 2, None));
        let eng = engine(catalog, inventory, users, Arc::new(FailSwitch::default()));

        let outcome = eng.issue(1, &["astro".to_string()]).await.expect("issue");
        assert!(matches!(outcome, Outcome::LimitReached));
    }

    #[tokio::test]
    async fn wait_outcome_when_interval_not_elapsed() {
        let catalog = GameCatalog::from_games(vec![game("astro", false)]);
        let inventory = seeded_inventory("astro", 10).await;
        let users = Arc::new(InMemoryUserStore::default());
        let original_request_time = Utc::now();
        users.seed(user(1, Status::Free, 0, Some(original_request_time)));
        let eng = engine(catalog, inventory, Arc::clone(&users), Arc::new(FailSwitch::default()));

        let outcome = eng.issue(1, &["astro".to_string()]).await.expect("issue");
        assert!(matches!(outcome, Outcome::Wait { .. }));

        // `last_request_time` must not be touched by a `wait` outcome.
        let after = users.get_user(1).await.expect("get").expect("present");
        assert_eq!(after.last_request_time, Some(original_request_time));
        assert_eq!(after.daily_request_count, 0);
    }

    #[tokio::test]
    async fn boosted_game_draws_k_boosted() {
        let catalog = GameCatalog::from_games(vec![game("astro", true), game("merge", false)]);
        let durable = Arc::new(InMemoryDurableStore::default());
        let warm = Arc::new(InMemoryWarmTier::default());
        let inventory = Arc::new(Inventory::new(durable, warm));
        for i in 0..20 {
            inventory.append("astro", Code::new(format!("a{i}"), Utc::now())).await.expect("seed");
            inventory.append("merge", Code::new(format!("m{i}"), Utc::now())).await.expect("seed");
        }
        let users = Arc::new(InMemoryUserStore::default());
        users.seed(user(1, Status::Premium, 0, None));
        let eng = engine(catalog, inventory, users, Arc::new(FailSwitch::default()));

        let outcome = eng.issue(1, &["astro".to_string(), "merge".to_string()]).await.expect("issue");
        let Outcome::Granted(draws) = outcome else { panic!("expected Granted") };
        assert_eq!(draws.iter().find(|d| d.game == "astro").unwrap().codes.len(), 8);
        assert_eq!(draws.iter().find(|d| d.game == "merge").unwrap().codes.len(), 4);
    }

    #[tokio::test]
    async fn banned_user_is_rejected_before_any_draw() {
        let catalog = GameCatalog::from_games(vec![game("astro", false)]);
        let inventory = seeded_inventory("astro", 10).await;
        let users = Arc::new(InMemoryUserStore::default());
        let mut record = user(1, Status::Free, 0, None);
        record.is_banned = true;
        users.seed(record);
        let eng = engine(catalog, inventory, users, Arc::new(FailSwitch::default()));

        let outcome = eng.issue(1, &["astro".to_string()]).await.expect("issue");
        assert!(matches!(outcome, Outcome::Banned));
    }

    #[tokio::test]
    async fn commit_failure_restores_codes_and_leaves_counter_unchanged() {
        let catalog = GameCatalog::from_games(vec![game("astro", false)]);
        let inventory = seeded_inventory("astro", 3).await;
        let users = Arc::new(InMemoryUserStore::default());
        users.seed(user(1, Status::Free, 0, None));
        let fail = Arc::new(FailSwitch::default());
        fail.set(true);
        let eng = engine(catalog, inventory.clone(), Arc::clone(&users), Arc::clone(&fail));

        let result = eng.issue(1, &["astro".to_string()]).await;
        assert!(result.is_err());

        let after = users.get_user(1).await.expect("get").expect("present");
        assert_eq!(after.daily_request_count, 0);

        let restored = inventory.peek_oldest("astro", 4).await.expect("peek");
        assert_eq!(restored.len(), 3);
    }

    #[test]
    fn daily_reset_is_idempotent_within_the_same_day() {
        let today = NaiveDate::from_ymd_opt(2026, 7, 26).expect("valid date");
        let mut record = user(1, Status::Free, 2, None);
        record.last_reset_date = today;
        assert!(!record.needs_daily_reset(today));
    }
}
