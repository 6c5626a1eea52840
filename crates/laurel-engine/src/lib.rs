pub mod aggregate;
pub mod distribute;
pub mod group_goal;
pub mod orchestrator;
pub mod rank;
pub mod stats;

pub use aggregate::{aggregate, matches_filter};
pub use distribute::{DistributionReport, MutationOutcome, OutcomeStatus, RewardDistributor};
pub use group_goal::{apply_reset, update_group_goal};
pub use orchestrator::{BoardView, PassReport};
pub use rank::{rank, resolve_name, RankedEntry, Ranking};
pub use stats::UserStat;

use anyhow::Result;
use chrono::{DateTime, Utc};
use laurel_activity::{ActivitySource, UserDirectory};
use laurel_economics::{EquipState, InventoryStore, RewardCatalog, WalletLedger};
use laurel_storage::StateStore;
use laurel_types::{LaurelError, LeaderboardDefinition, LeaderboardId};
use std::sync::Arc;
use tracing::info;

/// Facade over the whole engine: aggregation, ranking, group goals and
/// reward distribution for every leaderboard definition.
pub struct RankingEngine {
    store: Arc<StateStore>,
    directory: Arc<dyn UserDirectory>,
    activity: Arc<dyn ActivitySource>,
    distributor: RewardDistributor,
}

impl RankingEngine {
    pub fn new(
        store: Arc<StateStore>,
        directory: Arc<dyn UserDirectory>,
        activity: Arc<dyn ActivitySource>,
        wallet: Arc<dyn WalletLedger>,
        inventory: Arc<dyn InventoryStore>,
        equip: Arc<dyn EquipState>,
        catalog: Arc<dyn RewardCatalog>,
    ) -> Self {
        let distributor =
            RewardDistributor::new(store.clone(), wallet, inventory, equip, catalog);
        Self {
            store,
            directory,
            activity,
            distributor,
        }
    }

    /// Administrator CRUD over definitions and manual entries goes through
    /// the tombstone-guarded store.
    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Validated administrator create/update of a leaderboard definition.
    pub async fn upsert_definition(&self, definition: LeaderboardDefinition) -> Result<()> {
        if definition.title.trim().is_empty() {
            return Err(
                LaurelError::Validation("leaderboard title must not be empty".to_string()).into(),
            );
        }
        if definition.is_group_goal && !definition.group_goal_target.is_finite() {
            return Err(LaurelError::Validation(format!(
                "group goal target must be a finite number, got {}",
                definition.group_goal_target
            ))
            .into());
        }
        self.store.upsert_definition(definition).await?;
        Ok(())
    }

    pub(crate) fn directory_source(&self) -> &Arc<dyn UserDirectory> {
        &self.directory
    }

    pub(crate) fn activity_source(&self) -> &Arc<dyn ActivitySource> {
        &self.activity
    }

    pub(crate) fn distributor(&self) -> &RewardDistributor {
        &self.distributor
    }

    /// Begin a new group-goal epoch: zero per-entry period amounts, clear
    /// progress and achievement, stamp the reset time.
    pub async fn reset_group_goal(
        &self,
        id: &LeaderboardId,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let Some(mut definition) = self.store.get_definition(id).await? else {
            return Err(LaurelError::NotFound(id.to_string()).into());
        };

        let mut entries = self.store.manual_entries(id).await?;
        definition.group_goal = apply_reset(&mut entries, now);
        self.store.set_manual_entries(id, entries).await?;
        self.store.upsert_definition(definition).await?;

        info!(leaderboard = %id, "♻️ Group goal reset, new epoch started");
        Ok(())
    }

    /// Administrative reset of the idempotence ledger.
    pub async fn reset_claims(&self) -> Result<()> {
        self.store.reset_claims().await?;
        Ok(())
    }
}
