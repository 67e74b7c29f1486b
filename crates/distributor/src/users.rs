// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Codewell Contributors

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use codewell_core::{Role, Status, UserRecord};
use sqlx::PgPool;

/// Identity fields supplied by the external chat layer on first contact.
pub struct NewUser {
    pub user_id: i64,
    pub chat_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

/// Operator-settable fields: ban status, role, status tier, and free-text
/// notes, all settable out-of-band from the request path.
pub enum UserFlag {
    Banned(bool),
    Role(Role),
    Status(Status),
    Notes(Option<String>),
}

/// Per-user state backing. All writes from the request path use the atomic
/// path in [`crate::issuance::QuotaCommit`]; these are the non-atomic
/// operator/identity operations.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user(&self, user_id: i64) -> anyhow::Result<Option<UserRecord>>;
    async fn upsert_user(&self, identity: NewUser, language: &str) -> anyhow::Result<UserRecord>;
    async fn set_language(&self, user_id: i64, language: &str) -> anyhow::Result<()>;
    async fn set_flag(&self, user_id: i64, flag: UserFlag) -> anyhow::Result<()>;
    /// Atomically zero `daily_request_count` and bump `last_reset_date` to
    /// `today`.
    async fn reset_daily(&self, user_id: i64, today: NaiveDate) -> anyhow::Result<()>;
}

pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PostgresUserStore {
    async fn get_user(&self, user_id: i64) -> anyhow::Result<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(UserRow::into_record))
    }

    async fn upsert_user(&self, identity: NewUser, language: &str) -> anyhow::Result<UserRecord> {
        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (user_id, chat_id, language, first_name, last_name, username, \
                status, daily_request_count, last_reset_date, last_request_time, \
                total_keys_generated, is_banned, role, notes, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, 'free', 0, CURRENT_DATE, NULL, 0, false, 'user', NULL, now()) \
             ON CONFLICT (user_id) DO NOTHING \
             RETURNING *",
        )
        .bind(identity.user_id)
        .bind(identity.chat_id)
        .bind(language)
        .bind(&identity.first_name)
        .bind(&identity.last_name)
        .bind(&identity.username)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(r.into_record()),
            None => self
                .get_user(identity.user_id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("upsert raced and user still missing")),
        }
    }

    async fn set_language(&self, user_id: i64, language: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET language = $1 WHERE user_id = $2")
            .bind(language)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_flag(&self, user_id: i64, flag: UserFlag) -> anyhow::Result<()> {
        match flag {
            UserFlag::Banned(v) => {
                sqlx::query("UPDATE users SET is_banned = $1 WHERE user_id = $2")
                    .bind(v)
                    .bind(user_id)
                    .execute(&self.pool)
                    .await?;
            }
            UserFlag::Role(role) => {
                let value = match role {
                    Role::User => "user",
                    Role::Admin => "admin",
                };
                sqlx::query("UPDATE users SET role = $1 WHERE user_id = $2")
                    .bind(value)
                    .bind(user_id)
                    .execute(&self.pool)
                    .await?;
            }
            UserFlag::Status(status) => {
                let value = match status {
                    Status::Free => "free",
                    Status::Friend => "friend",
                    Status::Premium => "premium",
                };
                sqlx::query("UPDATE users SET status = $1 WHERE user_id = $2")
                    .bind(value)
                    .bind(user_id)
                    .execute(&self.pool)
                    .await?;
            }
            UserFlag::Notes(notes) => {
                sqlx::query("UPDATE users SET notes = $1 WHERE user_id = $2")
                    .bind(notes)
                    .bind(user_id)
                    .execute(&self.pool)
                    .await?;
            }
        }
        Ok(())
    }

    async fn reset_daily(&self, user_id: i64, today: NaiveDate) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE users SET daily_request_count = 0, last_reset_date = $1 \
             WHERE user_id = $2 AND last_reset_date < $1",
        )
        .bind(today)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: i64,
    chat_id: i64,
    language: String,
    first_name: Option<String>,
    last_name: Option<String>,
    username: Option<String>,
    status: String,
    daily_request_count: i32,
    last_reset_date: NaiveDate,
    last_request_time: Option<DateTime<Utc>>,
    total_keys_generated: i64,
    is_banned: bool,
    role: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_record(self) -> UserRecord {
        UserRecord {
            user_id: self.user_id,
            chat_id: self.chat_id,
            language: self.language,
            first_name: self.first_name,
            last_name: self.last_name,
            username: self.username,
            status: match self.status.as_str() {
                "friend" => Status::Friend,
                "premium" => Status::Premium,
                _ => Status::Free,
            },
            daily_request_count: self.daily_request_count.max(0) as u32,
            last_reset_date: self.last_reset_date,
            last_request_time: self.last_request_time,
            total_keys_generated: self.total_keys_generated.max(0) as u64,
            is_banned: self.is_banned,
            role: if self.role == "admin" { Role::Admin } else { Role::User },
            notes: self.notes,
            created_at: self.created_at,
        }
    }
}

/// In-memory fake for unit tests (no live Postgres needed).
#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<HashMap<i64, UserRecord>>,
}

impl InMemoryUserStore {
    pub fn seed(&self, record: UserRecord) {
        self.users.lock().unwrap_or_else(|e| e.into_inner()).insert(record.user_id, record);
    }

    /// Applies the commit-step mutation directly; used by
    /// [`crate::issuance::InMemoryQuotaCommit`] so the atomic path and the
    /// plain read path share one backing map in tests.
    pub fn apply_consume(&self, user_id: i64, codes_drawn: u64, now: DateTime<Utc>) -> anyhow::Result<()> {
        let mut users = self.users.lock().unwrap_or_else(|e| e.into_inner());
        let record = users.get_mut(&user_id).ok_or_else(|| anyhow::anyhow!("unknown user {user_id}"))?;
        record.daily_request_count += 1;
        record.total_keys_generated += codes_drawn;
        record.last_request_time = Some(now);
        Ok(())
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn get_user(&self, user_id: i64) -> anyhow::Result<Option<UserRecord>> {
        Ok(self.users.lock().unwrap_or_else(|e| e.into_inner()).get(&user_id).cloned())
    }

    async fn upsert_user(&self, identity: NewUser, language: &str) -> anyhow::Result<UserRecord> {
        let mut users = self.users.lock().unwrap_or_else(|e| e.into_inner());
        let record = users.entry(identity.user_id).or_insert_with(|| UserRecord {
            user_id: identity.user_id,
            chat_id: identity.chat_id,
            language: language.to_string(),
            first_name: identity.first_name,
            last_name: identity.last_name,
            username: identity.username,
            status: Status::Free,
            daily_request_count: 0,
            last_reset_date: Utc::now().date_naive(),
            last_request_time: None,
            total_keys_generated: 0,
            is_banned: false,
            role: Role::User,
            notes: None,
            created_at: Utc::now(),
        });
        Ok(record.clone())
    }

    async fn set_language(&self, user_id: i64, language: &str) -> anyhow::Result<()> {
        if let Some(record) = self.users.lock().unwrap_or_else(|e| e.into_inner()).get_mut(&user_id) {
            record.language = language.to_string();
        }
        Ok(())
    }

    async fn set_flag(&self, user_id: i64, flag: UserFlag) -> anyhow::Result<()> {
        let mut users = self.users.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(record) = users.get_mut(&user_id) {
            match flag {
                UserFlag::Banned(v) => record.is_banned = v,
                UserFlag::Role(role) => record.role = role,
                UserFlag::Status(status) => record.status = status,
                UserFlag::Notes(notes) => record.notes = notes,
            }
        }
        Ok(())
    }

    async fn reset_daily(&self, user_id: i64, today: NaiveDate) -> anyhow::Result<()> {
        let mut users = self.users.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(record) = users.get_mut(&user_id) {
            if record.last_reset_date < today {
                record.daily_request_count = 0;
                record.last_reset_date = today;
            }
        }
        Ok(())
    }
}

/// Test-only failure injection flag, shared with
/// [`crate::issuance::InMemoryQuotaCommit`] to simulate a commit-transaction
/// fault.
#[derive(Default)]
pub struct FailSwitch(AtomicBool);

impl FailSwitch {
    pub fn set(&self, value: bool) {
        self.0.store(value, Ordering::SeqCst);
    }

    pub fn get(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
