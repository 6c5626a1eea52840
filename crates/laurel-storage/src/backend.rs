use async_trait::async_trait;
use laurel_types::{ClaimKey, LeaderboardDefinition, LeaderboardId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Leaderboard not found: {0}")]
    NotFound(String),

    #[error("Leaderboard deleted: {0}")]
    Tombstoned(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        Self::SerializationError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Administrator- or system-maintained override row. When present for a
/// leaderboard it supersedes computed aggregation entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualRankEntry {
    pub id: String,
    pub leaderboard_id: LeaderboardId,
    pub rank: u32,
    pub name: String,
    /// Lifetime total; keeps accumulating across group-goal resets.
    pub quantity: f64,
    pub minutes: f64,
    /// Amount accrued since the last reset epoch.
    pub period_quantity: f64,
}

impl ManualRankEntry {
    pub fn new(
        leaderboard_id: LeaderboardId,
        id: impl Into<String>,
        name: impl Into<String>,
        quantity: f64,
    ) -> Self {
        Self {
            id: id.into(),
            leaderboard_id,
            rank: 0,
            name: name.into(),
            quantity,
            minutes: 0.0,
            period_quantity: quantity,
        }
    }

    pub fn with_minutes(mut self, minutes: f64) -> Self {
        self.minutes = minutes;
        self
    }

    pub fn with_period_quantity(mut self, period_quantity: f64) -> Self {
        self.period_quantity = period_quantity;
        self
    }
}

/// Raw persisted-state operations over the shared key-value store.
///
/// The store offers no transactions or compare-and-swap; last write wins.
/// Callers get safety from idempotent algorithm design, not from this trait.
#[async_trait]
pub trait StateBackend: Send + Sync {
    async fn put_definition(&self, definition: &LeaderboardDefinition) -> Result<()>;
    async fn get_definition(&self, id: &LeaderboardId) -> Result<Option<LeaderboardDefinition>>;
    async fn remove_definition(&self, id: &LeaderboardId) -> Result<()>;
    async fn list_definitions(&self) -> Result<Vec<LeaderboardDefinition>>;

    async fn add_tombstone(&self, id: &LeaderboardId) -> Result<()>;
    async fn is_tombstoned(&self, id: &LeaderboardId) -> Result<bool>;

    async fn set_manual_entries(
        &self,
        id: &LeaderboardId,
        entries: Vec<ManualRankEntry>,
    ) -> Result<()>;
    async fn get_manual_entries(&self, id: &LeaderboardId) -> Result<Vec<ManualRankEntry>>;

    async fn put_claim(&self, key: &ClaimKey) -> Result<()>;
    async fn has_claim(&self, key: &ClaimKey) -> Result<bool>;
    async fn clear_claims(&self) -> Result<()>;
}
