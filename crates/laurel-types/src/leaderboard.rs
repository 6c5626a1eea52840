use crate::coins::Coins;
use crate::id::LeaderboardId;
use crate::metric::MetricType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reward families a leaderboard can hand out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RewardKind {
    Title,
    NameEffect,
    MessageEffect,
    Decoration,
    /// Currency/item payout tied to occupying ranks 1-3.
    Podium,
    /// Currency/item payout tied to a team goal crossing its target.
    GroupGoal,
}

impl RewardKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::NameEffect => "name-effect",
            Self::MessageEffect => "message-effect",
            Self::Decoration => "decoration",
            Self::Podium => "podium",
            Self::GroupGoal => "group-goal",
        }
    }

    /// Equip slot this kind occupies, if it is a wearable cosmetic.
    pub fn slot(&self) -> Option<EquipSlot> {
        match self {
            Self::Title => Some(EquipSlot::Title),
            Self::NameEffect => Some(EquipSlot::NameEffect),
            Self::MessageEffect => Some(EquipSlot::MessageEffect),
            Self::Decoration => Some(EquipSlot::Decoration),
            Self::Podium | Self::GroupGoal => None,
        }
    }

    pub const COSMETICS: [RewardKind; 4] = [
        RewardKind::Title,
        RewardKind::NameEffect,
        RewardKind::MessageEffect,
        RewardKind::Decoration,
    ];
}

impl fmt::Display for RewardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EquipSlot {
    Title,
    NameEffect,
    MessageEffect,
    Decoration,
}

impl EquipSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::NameEffect => "name-effect",
            Self::MessageEffect => "message-effect",
            Self::Decoration => "decoration",
        }
    }
}

impl fmt::Display for EquipSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Currency/item payout attached to podium ranks or a group goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RewardPayout {
    /// Cosmetics only.
    Text,
    Currency {
        amount: Coins,
    },
    Item {
        item: String,
        qty: u32,
    },
}

impl RewardPayout {
    /// Whether this payout moves currency or inventory (and therefore needs
    /// the claim ledger).
    pub fn is_payable(&self) -> bool {
        match self {
            Self::Text => false,
            Self::Currency { amount } => !amount.is_zero(),
            Self::Item { qty, .. } => *qty > 0,
        }
    }

    /// Canonical amount string folded into the claim key.
    pub fn amount_repr(&self) -> String {
        match self {
            Self::Text => "0".to_string(),
            Self::Currency { amount } => amount.points().to_string(),
            Self::Item { item, qty } => format!("{}x{}", item, qty),
        }
    }
}

impl Default for RewardPayout {
    fn default() -> Self {
        Self::Text
    }
}

/// Per-rank cosmetic references, configured for ranks 1-3.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankCosmetics {
    pub title: Option<String>,
    pub name_effect: Option<String>,
    pub message_effect: Option<String>,
    pub decoration: Option<String>,
}

impl RankCosmetics {
    pub fn style_for(&self, kind: RewardKind) -> Option<&str> {
        match kind {
            RewardKind::Title => self.title.as_deref(),
            RewardKind::NameEffect => self.name_effect.as_deref(),
            RewardKind::MessageEffect => self.message_effect.as_deref(),
            RewardKind::Decoration => self.decoration.as_deref(),
            RewardKind::Podium | RewardKind::GroupGoal => None,
        }
    }
}

/// Cumulative team progress, scoped to the current reset epoch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupGoalState {
    pub current_progress: f64,
    pub achieved_at: Option<DateTime<Utc>>,
    /// Start of the current epoch. Progress accrued before this timestamp
    /// does not count toward the current cycle.
    pub last_reset_at: Option<DateTime<Utc>>,
}

impl GroupGoalState {
    /// Claim-key period for the current epoch.
    pub fn epoch_repr(&self) -> String {
        match self.last_reset_at {
            Some(ts) => format!("epoch-{}", ts.timestamp()),
            None => "epoch-genesis".to_string(),
        }
    }
}

/// Administrator-configured panel: one scoring metric, optional activity
/// filter, and the reward rules for its podium.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardDefinition {
    pub id: LeaderboardId,
    pub title: String,
    pub metric: MetricType,
    /// Comma-separated keywords matched against work-item categories.
    pub activity_filter: Option<String>,
    /// Ranking is entirely hand-entered; metric aggregation is bypassed.
    pub is_manual: bool,
    pub is_group_goal: bool,
    pub group_goal_target: f64,
    pub payout: RewardPayout,
    /// Cosmetics for ranks 1-3, index 0 = rank 1.
    pub cosmetics: [RankCosmetics; 3],
    pub group_goal: GroupGoalState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LeaderboardDefinition {
    pub fn new(id: LeaderboardId, title: impl Into<String>, metric: MetricType) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: title.into(),
            metric,
            activity_filter: None,
            is_manual: false,
            is_group_goal: false,
            group_goal_target: 0.0,
            payout: RewardPayout::default(),
            cosmetics: Default::default(),
            group_goal: GroupGoalState::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.activity_filter = Some(filter.into());
        self
    }

    pub fn with_payout(mut self, payout: RewardPayout) -> Self {
        self.payout = payout;
        self
    }

    pub fn with_group_goal(mut self, target: f64) -> Self {
        self.is_group_goal = true;
        self.group_goal_target = target;
        self
    }

    pub fn with_cosmetics(mut self, rank: u8, cosmetics: RankCosmetics) -> Self {
        if (1..=3).contains(&rank) {
            self.cosmetics[rank as usize - 1] = cosmetics;
        }
        self
    }

    pub fn cosmetics_for_rank(&self, rank: u8) -> Option<&RankCosmetics> {
        if (1..=3).contains(&rank) {
            Some(&self.cosmetics[rank as usize - 1])
        } else {
            None
        }
    }

    /// A malformed target disables the feature rather than failing the pass.
    pub fn group_goal_enabled(&self) -> bool {
        self.is_group_goal
            && self.metric == MetricType::TotalQuantity
            && self.group_goal_target > 0.0
    }

    /// A group-goal board never also pays per-rank podium rewards.
    pub fn podium_payout_enabled(&self) -> bool {
        self.payout.is_payable() && !self.group_goal_enabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_goal_gating() {
        let board = LeaderboardDefinition::new(
            LeaderboardId::new("team"),
            "Team goal",
            MetricType::TotalQuantity,
        )
        .with_group_goal(100.0)
        .with_payout(RewardPayout::Currency {
            amount: Coins::new(25),
        });

        assert!(board.group_goal_enabled());
        assert!(!board.podium_payout_enabled());

        let zero_target = LeaderboardDefinition::new(
            LeaderboardId::new("broken"),
            "Broken goal",
            MetricType::TotalQuantity,
        )
        .with_group_goal(0.0);
        assert!(!zero_target.group_goal_enabled());

        let wrong_metric = LeaderboardDefinition::new(
            LeaderboardId::new("posts"),
            "Post goal",
            MetricType::PostCount,
        )
        .with_group_goal(100.0);
        assert!(!wrong_metric.group_goal_enabled());
    }

    #[test]
    fn test_cosmetics_rank_bounds() {
        let board = LeaderboardDefinition::new(
            LeaderboardId::new("b"),
            "Board",
            MetricType::TotalQuantity,
        )
        .with_cosmetics(
            1,
            RankCosmetics {
                title: Some("Champion".to_string()),
                ..Default::default()
            },
        );

        assert_eq!(
            board.cosmetics_for_rank(1).unwrap().title.as_deref(),
            Some("Champion")
        );
        assert!(board.cosmetics_for_rank(0).is_none());
        assert!(board.cosmetics_for_rank(4).is_none());
    }
}
