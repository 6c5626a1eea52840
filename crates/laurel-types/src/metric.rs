use serde::{Deserialize, Serialize};
use std::fmt;

/// Scoring rule for one leaderboard panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetricType {
    /// Achieved / planned ratio across matching work items, in percent.
    CompletionRate,
    /// Number of work items with the planned amount fully met.
    CompletedCount,
    /// Number of distinct days with matching work.
    TotalWorkItems,
    /// Sum of achieved amounts across matching work items.
    TotalQuantity,
    /// Accumulated minutes; fed by manual entries in practice.
    TotalTime,
    /// Number of posts authored.
    PostCount,
    /// De-duplicated departure + return driving assignments.
    DriverCount,
    /// Binary membership: present iff zero late marks this month.
    NoLateThisMonth,
}

impl MetricType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CompletionRate => "completion-rate",
            Self::CompletedCount => "completed-count",
            Self::TotalWorkItems => "total-work-items",
            Self::TotalQuantity => "total-quantity",
            Self::TotalTime => "total-time",
            Self::PostCount => "post-count",
            Self::DriverCount => "driver-count",
            Self::NoLateThisMonth => "no-late-this-month",
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
