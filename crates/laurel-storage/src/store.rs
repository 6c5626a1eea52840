use crate::backend::{ManualRankEntry, Result, StateBackend, StorageError};
use chrono::Utc;
use laurel_types::{ClaimKey, LeaderboardDefinition, LeaderboardId};
use std::sync::Arc;
use tracing::{debug, info};

/// Tombstone-guarded view over the shared persisted state.
///
/// Every definition read and write path consults the tombstone set, so a
/// session holding a stale replicated copy of a deleted leaderboard cannot
/// resurrect it or its rewards.
pub struct StateStore {
    backend: Arc<dyn StateBackend>,
}

impl StateStore {
    pub fn new(backend: Arc<dyn StateBackend>) -> Self {
        Self { backend }
    }

    /// Create or update a definition, refusing tombstoned ids.
    pub async fn upsert_definition(&self, mut definition: LeaderboardDefinition) -> Result<()> {
        if self.backend.is_tombstoned(&definition.id).await? {
            return Err(StorageError::Tombstoned(definition.id.to_string()));
        }

        definition.updated_at = Utc::now();
        self.backend.put_definition(&definition).await?;

        info!(
            leaderboard = %definition.id,
            metric = %definition.metric,
            is_manual = definition.is_manual,
            is_group_goal = definition.is_group_goal,
            "💾 Leaderboard definition stored"
        );
        Ok(())
    }

    pub async fn get_definition(
        &self,
        id: &LeaderboardId,
    ) -> Result<Option<LeaderboardDefinition>> {
        if self.backend.is_tombstoned(id).await? {
            debug!(leaderboard = %id, "Tombstoned leaderboard treated as absent");
            return Ok(None);
        }
        self.backend.get_definition(id).await
    }

    /// Live definitions only, tombstoned ids filtered out.
    pub async fn list_definitions(&self) -> Result<Vec<LeaderboardDefinition>> {
        let mut live = Vec::new();
        for definition in self.backend.list_definitions().await? {
            if !self.backend.is_tombstoned(&definition.id).await? {
                live.push(definition);
            }
        }
        Ok(live)
    }

    /// Delete a definition. The tombstone is written before the definition
    /// is removed so a crash between the two writes still leaves the id
    /// unresurrectable.
    pub async fn delete_definition(&self, id: &LeaderboardId) -> Result<()> {
        self.backend.add_tombstone(id).await?;
        self.backend.remove_definition(id).await?;
        self.backend.set_manual_entries(id, Vec::new()).await?;

        info!(leaderboard = %id, "🪦 Leaderboard deleted and tombstoned");
        Ok(())
    }

    pub async fn is_tombstoned(&self, id: &LeaderboardId) -> Result<bool> {
        self.backend.is_tombstoned(id).await
    }

    pub async fn manual_entries(&self, id: &LeaderboardId) -> Result<Vec<ManualRankEntry>> {
        self.backend.get_manual_entries(id).await
    }

    pub async fn set_manual_entries(
        &self,
        id: &LeaderboardId,
        entries: Vec<ManualRankEntry>,
    ) -> Result<()> {
        let count = entries.len();
        self.backend.set_manual_entries(id, entries).await?;
        info!(leaderboard = %id, entries = count, "📋 Manual entries replaced");
        Ok(())
    }

    /// Insert or replace one entry, matched by its row id.
    pub async fn upsert_manual_entry(&self, entry: ManualRankEntry) -> Result<()> {
        let id = entry.leaderboard_id.clone();
        let mut entries = self.backend.get_manual_entries(&id).await?;
        match entries.iter_mut().find(|e| e.id == entry.id) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
        self.backend.set_manual_entries(&id, entries).await
    }

    pub async fn remove_manual_entry(&self, id: &LeaderboardId, entry_id: &str) -> Result<()> {
        let mut entries = self.backend.get_manual_entries(id).await?;
        entries.retain(|e| e.id != entry_id);
        self.backend.set_manual_entries(id, entries).await
    }

    /// Record an idempotence claim. Returns false when the claim already
    /// existed — a success-no-op for the caller, never an error.
    pub async fn record_claim(&self, key: &ClaimKey) -> Result<bool> {
        if self.backend.has_claim(key).await? {
            debug!(claim = %key, "Claim already present, treating as no-op");
            return Ok(false);
        }
        self.backend.put_claim(key).await?;
        info!(claim = %key, "🧾 Reward claim recorded");
        Ok(true)
    }

    pub async fn has_claim(&self, key: &ClaimKey) -> Result<bool> {
        self.backend.has_claim(key).await
    }

    /// Administrative reset of the whole claim ledger.
    pub async fn reset_claims(&self) -> Result<()> {
        self.backend.clear_claims().await?;
        info!("🧹 Claim ledger cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBackend;
    use laurel_types::MetricType;

    fn store() -> StateStore {
        StateStore::new(Arc::new(MemoryBackend::new()))
    }

    fn definition(id: &str) -> LeaderboardDefinition {
        LeaderboardDefinition::new(LeaderboardId::new(id), id.to_string(), MetricType::PostCount)
    }

    #[tokio::test]
    async fn test_tombstone_blocks_resurrection() {
        let store = store();
        let id = LeaderboardId::new("weekly");

        store.upsert_definition(definition("weekly")).await.unwrap();
        store.delete_definition(&id).await.unwrap();

        assert!(store.is_tombstoned(&id).await.unwrap());
        assert!(store.get_definition(&id).await.unwrap().is_none());
        assert!(store.list_definitions().await.unwrap().is_empty());

        // A stale session syncing its old copy back must be refused.
        let err = store
            .upsert_definition(definition("weekly"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Tombstoned(_)));
    }

    #[tokio::test]
    async fn test_delete_clears_manual_entries() {
        let store = store();
        let id = LeaderboardId::new("weekly");
        store.upsert_definition(definition("weekly")).await.unwrap();
        store
            .upsert_manual_entry(ManualRankEntry::new(id.clone(), "m1", "Alice", 50.0))
            .await
            .unwrap();
        assert_eq!(store.manual_entries(&id).await.unwrap().len(), 1);

        store.delete_definition(&id).await.unwrap();
        assert!(store.manual_entries(&id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_manual_entry_upsert_replaces_by_id() {
        let store = store();
        let id = LeaderboardId::new("weekly");

        store
            .upsert_manual_entry(ManualRankEntry::new(id.clone(), "m1", "Alice", 50.0))
            .await
            .unwrap();
        store
            .upsert_manual_entry(ManualRankEntry::new(id.clone(), "m1", "Alice", 70.0))
            .await
            .unwrap();

        let entries = store.manual_entries(&id).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].quantity, 70.0);

        store.remove_manual_entry(&id, "m1").await.unwrap();
        assert!(store.manual_entries(&id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_claim_is_recorded_once() {
        let store = store();
        let key = ClaimKey::derive(
            &LeaderboardId::new("weekly"),
            1,
            laurel_types::RewardKind::Podium,
            "50",
            "2026-08-06",
        );

        assert!(store.record_claim(&key).await.unwrap());
        assert!(!store.record_claim(&key).await.unwrap());
        assert!(store.has_claim(&key).await.unwrap());
    }
}
