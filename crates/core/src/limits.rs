// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Codewell Contributors

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::user::Status;

/// The quota and pacing knobs for one status tier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StatusLimits {
    pub daily_limit: u32,
    pub interval_minutes: i64,
}

/// The full `{free, friend, premium}` table, pure configuration read by the
/// issuance engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusLimitsTable {
    free: StatusLimits,
    friend: StatusLimits,
    premium: StatusLimits,
}

impl StatusLimitsTable {
    pub fn get(&self, status: Status) -> StatusLimits {
        match status {
            Status::Free => self.free,
            Status::Friend => self.friend,
            Status::Premium => self.premium,
        }
    }

    pub fn as_map(&self) -> HashMap<Status, StatusLimits> {
        [(Status::Free, self.free), (Status::Friend, self.friend), (Status::Premium, self.premium)]
            .into_iter()
            .collect()
    }
}

impl Default for StatusLimitsTable {
    /// Default tier values: free is deliberately small and slow, premium
    /// deliberately generous.
    fn default() -> Self {
        Self {
            free: StatusLimits { daily_limit: 2, interval_minutes: 60 },
            friend: StatusLimits { daily_limit: 6, interval_minutes: 20 },
            premium: StatusLimits { daily_limit: 20, interval_minutes: 5 },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_orders_tiers_by_generosity() {
        let table = StatusLimitsTable::default();
        let free = table.get(Status::Free);
        let friend = table.get(Status::Friend);
        let premium = table.get(Status::Premium);
        assert!(free.daily_limit < friend.daily_limit);
        assert!(friend.daily_limit < premium.daily_limit);
        assert!(free.interval_minutes > friend.interval_minutes);
        assert!(friend.interval_minutes > premium.interval_minutes);
    }
}
