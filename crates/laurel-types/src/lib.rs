pub mod coins;
pub mod error;
pub mod id;
pub mod leaderboard;
pub mod metric;

pub use coins::Coins;
pub use error::{LaurelError, Result};
pub use id::{ClaimKey, LeaderboardId, RewardId, UserId};
pub use leaderboard::{
    EquipSlot, GroupGoalState, LeaderboardDefinition, RankCosmetics, RewardKind, RewardPayout,
};
pub use metric::MetricType;
