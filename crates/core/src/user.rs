// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Codewell Contributors

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A user's status tier, controlling daily limit and inter-request interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Free,
    Friend,
    Premium,
}

/// Operator-assignable role; admins bypass quota/interval checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

/// Per-user row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: i64,
    pub chat_id: i64,
    pub language: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,

    pub status: Status,
    pub daily_request_count: u32,
    pub last_reset_date: NaiveDate,
    pub last_request_time: Option<DateTime<Utc>>,

    pub total_keys_generated: u64,

    pub is_banned: bool,
    pub role: Role,

    /// Operator free-text field, read/write only from the operator console,
    /// never touched by the request path.
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// `true` whenever `last_reset_date` is before `today`, i.e. the first
    /// quota check of a new UTC day must reset the counter.
    pub fn needs_daily_reset(&self, today: NaiveDate) -> bool {
        self.last_reset_date < today
    }
}
