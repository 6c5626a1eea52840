use anyhow::Result;
use async_trait::async_trait;
use laurel_types::{RewardId, UserId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// External inventory store consumed as a mutation target.
///
/// Grants and revokes are individually idempotent from the engine's side:
/// the engine only grants after checking holdings, and revoke-if-present is
/// naturally safe to repeat.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn grant(&self, user: &UserId, item: RewardId, qty: u32) -> Result<()>;
    async fn revoke(&self, user: &UserId, item: RewardId, qty: u32) -> Result<()>;
    async fn holdings(&self, user: &UserId) -> Result<Vec<(RewardId, u32)>>;

    async fn has(&self, user: &UserId, item: RewardId) -> Result<bool> {
        Ok(self
            .holdings(user)
            .await?
            .iter()
            .any(|(held, qty)| *held == item && *qty > 0))
    }
}

/// In-memory inventory for tests and local runs.
pub struct MemoryInventory {
    holdings: Arc<RwLock<HashMap<UserId, HashMap<RewardId, u32>>>>,
}

impl MemoryInventory {
    pub fn new() -> Self {
        Self {
            holdings: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for MemoryInventory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InventoryStore for MemoryInventory {
    async fn grant(&self, user: &UserId, item: RewardId, qty: u32) -> Result<()> {
        if qty == 0 {
            return Ok(());
        }

        let mut holdings = self.holdings.write().await;
        let slot = holdings
            .entry(user.clone())
            .or_default()
            .entry(item)
            .or_insert(0);
        *slot = slot.saturating_add(qty);

        info!(user = %user, item = %item, qty = qty, total = *slot, "🎁 Item granted");
        Ok(())
    }

    async fn revoke(&self, user: &UserId, item: RewardId, qty: u32) -> Result<()> {
        let mut holdings = self.holdings.write().await;
        let Some(user_items) = holdings.get_mut(user) else {
            return Ok(());
        };
        let Some(slot) = user_items.get_mut(&item) else {
            return Ok(());
        };

        *slot = slot.saturating_sub(qty);
        if *slot == 0 {
            user_items.remove(&item);
        }

        info!(user = %user, item = %item, qty = qty, "🗑️ Item revoked");
        Ok(())
    }

    async fn holdings(&self, user: &UserId) -> Result<Vec<(RewardId, u32)>> {
        let holdings = self.holdings.read().await;
        Ok(holdings
            .get(user)
            .map(|items| items.iter().map(|(id, qty)| (*id, *qty)).collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use laurel_types::{LeaderboardId, RewardKind};

    fn reward(rank: u8) -> RewardId {
        RewardId::derive(&LeaderboardId::new("weekly"), RewardKind::Title, rank)
    }

    #[tokio::test]
    async fn test_grant_revoke_round_trip() {
        let inventory = MemoryInventory::new();
        let alice = UserId::new("alice");

        inventory.grant(&alice, reward(1), 1).await.unwrap();
        assert!(inventory.has(&alice, reward(1)).await.unwrap());
        assert!(!inventory.has(&alice, reward(2)).await.unwrap());

        inventory.revoke(&alice, reward(1), 1).await.unwrap();
        assert!(!inventory.has(&alice, reward(1)).await.unwrap());
        assert!(inventory.holdings(&alice).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_revoke_absent_is_noop() {
        let inventory = MemoryInventory::new();
        let alice = UserId::new("alice");

        // Revoking something never granted must not fail; the distributor
        // repeats revokes freely.
        inventory.revoke(&alice, reward(1), 1).await.unwrap();
        assert!(inventory.holdings(&alice).await.unwrap().is_empty());
    }
}
