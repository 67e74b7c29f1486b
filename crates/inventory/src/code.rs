// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Codewell Contributors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An opaque code minted by the upstream, plus the timestamp that orders it
/// within its game partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Code {
    pub value: String,
    pub created_at: DateTime<Utc>,
}

impl Code {
    pub fn new(value: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self { value: value.into(), created_at }
    }
}
