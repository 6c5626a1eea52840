use crate::backend::{ManualRankEntry, Result, StateBackend};
use async_trait::async_trait;
use laurel_types::{ClaimKey, LeaderboardDefinition, LeaderboardId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory state backend for testing and development.
pub struct MemoryBackend {
    definitions: Arc<RwLock<HashMap<LeaderboardId, LeaderboardDefinition>>>,
    tombstones: Arc<RwLock<HashSet<LeaderboardId>>>,
    manual_entries: Arc<RwLock<HashMap<LeaderboardId, Vec<ManualRankEntry>>>>,
    claims: Arc<RwLock<HashSet<ClaimKey>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            definitions: Arc::new(RwLock::new(HashMap::new())),
            tombstones: Arc::new(RwLock::new(HashSet::new())),
            manual_entries: Arc::new(RwLock::new(HashMap::new())),
            claims: Arc::new(RwLock::new(HashSet::new())),
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StateBackend for MemoryBackend {
    async fn put_definition(&self, definition: &LeaderboardDefinition) -> Result<()> {
        let mut definitions = self.definitions.write().await;
        definitions.insert(definition.id.clone(), definition.clone());
        Ok(())
    }

    async fn get_definition(&self, id: &LeaderboardId) -> Result<Option<LeaderboardDefinition>> {
        let definitions = self.definitions.read().await;
        Ok(definitions.get(id).cloned())
    }

    async fn remove_definition(&self, id: &LeaderboardId) -> Result<()> {
        let mut definitions = self.definitions.write().await;
        definitions.remove(id);
        Ok(())
    }

    async fn list_definitions(&self) -> Result<Vec<LeaderboardDefinition>> {
        let definitions = self.definitions.read().await;
        let mut all: Vec<LeaderboardDefinition> = definitions.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(all)
    }

    async fn add_tombstone(&self, id: &LeaderboardId) -> Result<()> {
        let mut tombstones = self.tombstones.write().await;
        tombstones.insert(id.clone());
        Ok(())
    }

    async fn is_tombstoned(&self, id: &LeaderboardId) -> Result<bool> {
        let tombstones = self.tombstones.read().await;
        Ok(tombstones.contains(id))
    }

    async fn set_manual_entries(
        &self,
        id: &LeaderboardId,
        entries: Vec<ManualRankEntry>,
    ) -> Result<()> {
        let mut manual = self.manual_entries.write().await;
        if entries.is_empty() {
            manual.remove(id);
        } else {
            manual.insert(id.clone(), entries);
        }
        Ok(())
    }

    async fn get_manual_entries(&self, id: &LeaderboardId) -> Result<Vec<ManualRankEntry>> {
        let manual = self.manual_entries.read().await;
        Ok(manual.get(id).cloned().unwrap_or_default())
    }

    async fn put_claim(&self, key: &ClaimKey) -> Result<()> {
        let mut claims = self.claims.write().await;
        claims.insert(*key);
        Ok(())
    }

    async fn has_claim(&self, key: &ClaimKey) -> Result<bool> {
        let claims = self.claims.read().await;
        Ok(claims.contains(key))
    }

    async fn clear_claims(&self) -> Result<()> {
        let mut claims = self.claims.write().await;
        claims.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use laurel_types::{MetricType, RewardKind};

    #[tokio::test]
    async fn test_definition_round_trip() {
        let backend = MemoryBackend::new();
        let id = LeaderboardId::new("weekly");
        let def = LeaderboardDefinition::new(id.clone(), "Weekly", MetricType::TotalQuantity);

        backend.put_definition(&def).await.unwrap();
        let loaded = backend.get_definition(&id).await.unwrap().unwrap();
        assert_eq!(loaded.title, "Weekly");

        backend.remove_definition(&id).await.unwrap();
        assert!(backend.get_definition(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_claim_membership() {
        let backend = MemoryBackend::new();
        let key = ClaimKey::derive(
            &LeaderboardId::new("weekly"),
            1,
            RewardKind::Podium,
            "50",
            "2026-08-06",
        );

        assert!(!backend.has_claim(&key).await.unwrap());
        backend.put_claim(&key).await.unwrap();
        assert!(backend.has_claim(&key).await.unwrap());

        backend.clear_claims().await.unwrap();
        assert!(!backend.has_claim(&key).await.unwrap());
    }
}
