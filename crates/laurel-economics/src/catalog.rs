use anyhow::Result;
use async_trait::async_trait;
use laurel_types::{LeaderboardDefinition, LeaderboardId, RewardId, RewardKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Materialized reward definition.
///
/// Identity is derived, never stored mutable: editing a leaderboard's
/// cosmetic fields updates the label/style in place and every existing
/// holder sees the change without a re-grant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardItem {
    pub id: RewardId,
    pub leaderboard_id: LeaderboardId,
    pub rank: u8,
    pub kind: RewardKind,
    pub label: String,
    pub style: Option<String>,
}

/// Catalog of materialized reward definitions keyed by stable identity.
#[async_trait]
pub trait RewardCatalog: Send + Sync {
    async fn materialize(&self, item: RewardItem) -> Result<RewardId>;
    async fn get(&self, id: RewardId) -> Result<Option<RewardItem>>;
    async fn for_leaderboard(&self, id: &LeaderboardId) -> Result<Vec<RewardItem>>;
}

/// Build the catalog row for one rank cosmetic of a definition.
pub fn cosmetic_item(
    definition: &LeaderboardDefinition,
    kind: RewardKind,
    rank: u8,
) -> Option<RewardItem> {
    let cosmetics = definition.cosmetics_for_rank(rank)?;
    let style = cosmetics.style_for(kind)?;

    let label = match kind {
        RewardKind::Title => style.to_string(),
        _ => format!("{} (rank {})", definition.title, rank),
    };

    Some(RewardItem {
        id: RewardId::derive(&definition.id, kind, rank),
        leaderboard_id: definition.id.clone(),
        rank,
        kind,
        label,
        style: Some(style.to_string()),
    })
}

/// In-memory catalog for tests and local runs.
pub struct MemoryCatalog {
    items: Arc<RwLock<HashMap<RewardId, RewardItem>>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self {
            items: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RewardCatalog for MemoryCatalog {
    async fn materialize(&self, item: RewardItem) -> Result<RewardId> {
        let mut items = self.items.write().await;
        let id = item.id;

        match items.get(&id) {
            Some(existing) if existing == &item => {}
            Some(_) => {
                items.insert(id, item);
                info!(reward = %id, "🔄 Reward definition updated in place");
            }
            None => {
                items.insert(id, item);
                info!(reward = %id, "✨ Reward definition materialized");
            }
        }

        Ok(id)
    }

    async fn get(&self, id: RewardId) -> Result<Option<RewardItem>> {
        let items = self.items.read().await;
        Ok(items.get(&id).cloned())
    }

    async fn for_leaderboard(&self, id: &LeaderboardId) -> Result<Vec<RewardItem>> {
        let items = self.items.read().await;
        let mut found: Vec<RewardItem> = items
            .values()
            .filter(|item| &item.leaderboard_id == id)
            .cloned()
            .collect();
        found.sort_by_key(|item| (item.rank, item.kind.as_str()));
        Ok(found)
    }
}
