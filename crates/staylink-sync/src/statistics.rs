//! Aggregate sync statistics derived from log history.

use serde::{Deserialize, Serialize};

use staylink_db::models::{ChannelSyncLog, SyncStatus};

/// Default lookback window for statistics queries, in days.
pub const DEFAULT_STATISTICS_WINDOW_DAYS: i64 = 7;

/// Outcome counts over a window of sync log history.
///
/// Derived on demand from the log rows; nothing here is stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncStatistics {
    /// Every attempt in the window, regardless of status.
    #[serde(default)]
    pub total: u64,

    /// Attempts that completed successfully.
    #[serde(default)]
    pub successful: u64,

    /// Attempts that failed terminally.
    #[serde(default)]
    pub failed: u64,

    /// Attempts still waiting to run.
    #[serde(default)]
    pub pending: u64,

    /// Successful share of all attempts, as a percentage.
    #[serde(default)]
    pub success_rate: f64,
}

impl SyncStatistics {
    /// Fold log rows into aggregate counts.
    ///
    /// An empty window yields a success rate of 0.0 rather than a
    /// division by zero.
    #[must_use]
    pub fn from_logs(logs: &[ChannelSyncLog]) -> Self {
        let mut stats = SyncStatistics {
            total: logs.len() as u64,
            ..SyncStatistics::default()
        };
        for log in logs {
            match log.status {
                SyncStatus::Success => stats.successful += 1,
                SyncStatus::Failed => stats.failed += 1,
                SyncStatus::Pending => stats.pending += 1,
                _ => {}
            }
        }
        stats.success_rate = if stats.total == 0 {
            0.0
        } else {
            (stats.successful as f64 / stats.total as f64) * 100.0
        };
        stats
    }
}
