use anyhow::Result;
use async_trait::async_trait;
use laurel_types::{EquipSlot, RewardId, UserId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// External equip state consumed as a mutation target. One item per slot.
#[async_trait]
pub trait EquipState: Send + Sync {
    async fn equip(&self, user: &UserId, item: RewardId, slot: EquipSlot) -> Result<()>;
    async fn unequip(&self, user: &UserId, slot: EquipSlot) -> Result<()>;
    async fn equipped(&self, user: &UserId) -> Result<HashMap<EquipSlot, RewardId>>;
}

/// In-memory equip state for tests and local runs.
pub struct MemoryEquip {
    slots: Arc<RwLock<HashMap<UserId, HashMap<EquipSlot, RewardId>>>>,
}

impl MemoryEquip {
    pub fn new() -> Self {
        Self {
            slots: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for MemoryEquip {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EquipState for MemoryEquip {
    async fn equip(&self, user: &UserId, item: RewardId, slot: EquipSlot) -> Result<()> {
        let mut slots = self.slots.write().await;
        slots.entry(user.clone()).or_default().insert(slot, item);
        info!(user = %user, slot = %slot, item = %item, "🪄 Cosmetic equipped");
        Ok(())
    }

    async fn unequip(&self, user: &UserId, slot: EquipSlot) -> Result<()> {
        let mut slots = self.slots.write().await;
        if let Some(user_slots) = slots.get_mut(user) {
            if user_slots.remove(&slot).is_some() {
                info!(user = %user, slot = %slot, "🧺 Cosmetic unequipped");
            }
        }
        Ok(())
    }

    async fn equipped(&self, user: &UserId) -> Result<HashMap<EquipSlot, RewardId>> {
        let slots = self.slots.read().await;
        Ok(slots.get(user).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use laurel_types::{LeaderboardId, RewardKind};

    #[tokio::test]
    async fn test_slot_replacement() {
        let equip = MemoryEquip::new();
        let alice = UserId::new("alice");
        let board = LeaderboardId::new("weekly");
        let first = RewardId::derive(&board, RewardKind::Title, 1);
        let second = RewardId::derive(&board, RewardKind::Title, 2);

        equip.equip(&alice, first, EquipSlot::Title).await.unwrap();
        equip.equip(&alice, second, EquipSlot::Title).await.unwrap();

        let slots = equip.equipped(&alice).await.unwrap();
        assert_eq!(slots.get(&EquipSlot::Title), Some(&second));

        equip.unequip(&alice, EquipSlot::Title).await.unwrap();
        assert!(equip.equipped(&alice).await.unwrap().is_empty());
    }
}
