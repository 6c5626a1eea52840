use crate::stats::UserStat;
use laurel_activity::UserProfile;
use laurel_storage::ManualRankEntry;
use laurel_types::{LeaderboardDefinition, MetricType, UserId};
use serde::Serialize;
use std::collections::BTreeMap;

/// One row of an ordered ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry {
    /// Resolved identity; `None` when a manual entry's name matches nobody
    /// in the directory snapshot.
    pub user: Option<UserId>,
    pub name: String,
    pub value: f64,
    /// Zero-value slots stay visible to the distributor but never earn
    /// rewards.
    pub eligible: bool,
}

/// Ordered ranking plus the podium slice.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Ranking {
    /// Visible list; zero-value entries are excluded ("has not yet appeared
    /// on the board").
    pub entries: Vec<RankedEntry>,
    /// First three of the full order, zero-value slots flagged ineligible so
    /// stale holders of those ranks still get revoked.
    pub top3: Vec<RankedEntry>,
    /// Whether manual entries supplied the ordering.
    pub manual: bool,
}

impl Ranking {
    /// Occupant of a 1-based rank, if that slot is filled and eligible.
    pub fn occupant(&self, rank: u8) -> Option<&RankedEntry> {
        if rank == 0 {
            return None;
        }
        self.top3
            .get(rank as usize - 1)
            .filter(|entry| entry.eligible)
    }
}

/// Resolve a hand-entered name against the directory snapshot.
pub fn resolve_name(name: &str, directory: &[UserProfile]) -> Option<UserId> {
    directory
        .iter()
        .find(|u| u.display_name == name || u.id.as_str() == name)
        .map(|u| u.id.clone())
}

/// Derive the ordered ranking and top-3 for one leaderboard.
///
/// Manual entries, when present, are the sole ordering source; computed
/// stats only order the board when no manual entry exists at all.
pub fn rank(
    definition: &LeaderboardDefinition,
    stats: &BTreeMap<UserId, UserStat>,
    manual: &[ManualRankEntry],
    directory: &[UserProfile],
) -> Ranking {
    if !manual.is_empty() {
        return rank_manual(manual, directory);
    }
    rank_computed(definition, stats)
}

fn rank_manual(manual: &[ManualRankEntry], directory: &[UserProfile]) -> Ranking {
    let mut ordered: Vec<&ManualRankEntry> = manual.iter().collect();
    // Stable sort keeps insertion order for ties.
    ordered.sort_by(|a, b| {
        b.quantity
            .partial_cmp(&a.quantity)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let rows: Vec<RankedEntry> = ordered
        .into_iter()
        .map(|entry| RankedEntry {
            user: resolve_name(&entry.name, directory),
            name: entry.name.clone(),
            value: entry.quantity,
            eligible: entry.quantity > 0.0,
        })
        .collect();

    Ranking {
        entries: rows.iter().filter(|r| r.eligible).cloned().collect(),
        top3: rows.into_iter().take(3).collect(),
        manual: true,
    }
}

fn rank_computed(
    definition: &LeaderboardDefinition,
    stats: &BTreeMap<UserId, UserStat>,
) -> Ranking {
    let mut rows: Vec<RankedEntry> = stats
        .values()
        .map(|stat| {
            let value = stat.metric_value(definition.metric);
            RankedEntry {
                user: Some(stat.user.clone()),
                name: stat.display_name.clone(),
                value,
                eligible: value > 0.0,
            }
        })
        .collect();

    if definition.metric == MetricType::NoLateThisMonth {
        // Binary membership, alphabetical order.
        rows.retain(|row| row.eligible);
        rows.sort_by(|a, b| a.name.cmp(&b.name));
    } else {
        rows.sort_by(|a, b| {
            b.value
                .partial_cmp(&a.value)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    Ranking {
        entries: rows.iter().filter(|r| r.eligible).cloned().collect(),
        top3: rows.into_iter().take(3).collect(),
        manual: false,
    }
}
