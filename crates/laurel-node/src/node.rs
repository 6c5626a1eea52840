use crate::config::NodeConfig;
use anyhow::Result;
use chrono::{Duration as ChronoDuration, Utc};
use laurel_activity::{
    ActivityRecord, ActivitySource, Assignment, DriveDirection, MemoryActivityLog,
    MemoryDirectory, UserDirectory, UserProfile,
};
use laurel_economics::{
    EquipState, InventoryStore, MemoryCatalog, MemoryEquip, MemoryInventory, MemoryWallet,
    RewardCatalog, WalletLedger,
};
use laurel_engine::RankingEngine;
use laurel_storage::{ManualRankEntry, MemoryBackend, StateStore};
use laurel_types::{
    Coins, LeaderboardDefinition, LeaderboardId, MetricType, RankCosmetics, RewardPayout,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Handle for pushing a change notification into the run loop.
#[derive(Clone)]
pub struct RecomputeHandle {
    tx: mpsc::Sender<()>,
}

impl RecomputeHandle {
    pub async fn notify(&self) {
        // A full queue already guarantees a pending pass.
        let _ = self.tx.try_send(());
    }
}

/// Owns the engine and drives recomputation from two triggers: a fixed
/// interval and explicit change notifications. There are no hidden timers
/// inside the engine itself.
pub struct LaurelNode {
    config: NodeConfig,
    engine: Arc<RankingEngine>,
    directory: Arc<MemoryDirectory>,
    activity: Arc<MemoryActivityLog>,
    trigger_tx: mpsc::Sender<()>,
    trigger_rx: mpsc::Receiver<()>,
}

impl LaurelNode {
    /// Build a node with in-memory collaborators. Production deployments
    /// swap these for adapters over the real external services.
    pub fn new(config: NodeConfig) -> Self {
        let store = Arc::new(StateStore::new(Arc::new(MemoryBackend::new())));
        let directory = Arc::new(MemoryDirectory::new());
        let activity = Arc::new(MemoryActivityLog::new());

        let engine = Arc::new(RankingEngine::new(
            store,
            directory.clone() as Arc<dyn UserDirectory>,
            activity.clone() as Arc<dyn ActivitySource>,
            Arc::new(MemoryWallet::new()) as Arc<dyn WalletLedger>,
            Arc::new(MemoryInventory::new()) as Arc<dyn InventoryStore>,
            Arc::new(MemoryEquip::new()) as Arc<dyn EquipState>,
            Arc::new(MemoryCatalog::new()) as Arc<dyn RewardCatalog>,
        ));

        let (trigger_tx, trigger_rx) = mpsc::channel(16);

        Self {
            config,
            engine,
            directory,
            activity,
            trigger_tx,
            trigger_rx,
        }
    }

    pub fn engine(&self) -> Arc<RankingEngine> {
        self.engine.clone()
    }

    pub fn recompute_handle(&self) -> RecomputeHandle {
        RecomputeHandle {
            tx: self.trigger_tx.clone(),
        }
    }

    /// Populate the in-memory collaborators with a small demo world.
    pub async fn seed_demo(&self) -> Result<()> {
        self.directory.add(UserProfile::new("alice", "Alice")).await;
        self.directory.add(UserProfile::new("bob", "Bob")).await;
        self.directory.add(UserProfile::new("carol", "Carol")).await;
        self.directory.add(UserProfile::admin("root", "Root")).await;

        let today = Utc::now().date_naive();
        let tomorrow = today + ChronoDuration::days(1);
        self.activity
            .extend([
                ActivityRecord::work_item(
                    "harvest",
                    tomorrow,
                    vec![
                        Assignment::new("alice", 10.0, 8.0),
                        Assignment::new("bob", 10.0, 10.0),
                    ],
                ),
                ActivityRecord::post("carol", Utc::now()),
                ActivityRecord::drive("bob", tomorrow, DriveDirection::Departure),
            ])
            .await;

        let store = self.engine.store();

        let quantity_board = LeaderboardDefinition::new(
            LeaderboardId::new("weekly-harvest"),
            "Weekly Harvest",
            MetricType::TotalQuantity,
        )
        .with_filter("harvest")
        .with_payout(RewardPayout::Currency {
            amount: Coins::new(10),
        })
        .with_cosmetics(
            1,
            RankCosmetics {
                title: Some("Harvest Champion".to_string()),
                name_effect: Some("gold-glow".to_string()),
                message_effect: Some("confetti".to_string()),
                decoration: None,
            },
        );
        store.upsert_definition(quantity_board).await?;

        let team_board = LeaderboardDefinition::new(
            LeaderboardId::new("team-goal"),
            "Team Goal",
            MetricType::TotalQuantity,
        )
        .with_group_goal(100.0)
        .with_payout(RewardPayout::Currency {
            amount: Coins::new(25),
        });
        let team_id = team_board.id.clone();
        store.upsert_definition(team_board).await?;
        store
            .upsert_manual_entry(ManualRankEntry::new(team_id.clone(), "m1", "Alice", 40.0))
            .await?;
        store
            .upsert_manual_entry(ManualRankEntry::new(team_id, "m2", "Bob", 35.0))
            .await?;

        info!("🌱 Demo data seeded");
        Ok(())
    }

    /// Main loop: one pass per interval tick or change notification, until
    /// ctrl-c.
    pub async fn run(self) -> Result<()> {
        let LaurelNode {
            config,
            engine,
            trigger_tx,
            mut trigger_rx,
            ..
        } = self;
        // Keep our own sender alive so the channel stays open even when no
        // external handle exists.
        let _trigger_tx = trigger_tx;

        let mut ticker =
            tokio::time::interval(Duration::from_secs(config.engine.recompute_interval_secs));

        info!(
            node = %config.node.name,
            interval_secs = config.engine.recompute_interval_secs,
            "🚀 Laurel node started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    run_pass(&engine).await;
                }
                Some(()) = trigger_rx.recv() => {
                    run_pass(&engine).await;
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("🛑 Shutdown requested");
                    break;
                }
            }
        }

        Ok(())
    }
}

async fn run_pass(engine: &RankingEngine) {
    let today = Utc::now().date_naive();
    match engine.recompute_all(today).await {
        Ok(pass) => {
            for report in &pass.reports {
                for failure in report.failures() {
                    warn!(
                        action = %failure.action,
                        detail = %failure.detail,
                        "⚠️ Reward mutation failed"
                    );
                }
            }
        }
        Err(e) => warn!(error = %e, "⚠️ Recomputation pass failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seeded_node_recomputes() {
        let node = LaurelNode::new(NodeConfig::default());
        node.seed_demo().await.unwrap();

        // A queued notification must not error even before the loop runs.
        let handle = node.recompute_handle();
        handle.notify().await;

        let engine = node.engine();
        let today = Utc::now().date_naive();
        let pass = engine.recompute_all(today).await.unwrap();
        assert_eq!(pass.processed, 2);

        let view = engine
            .current_ranking(&LeaderboardId::new("team-goal"), today)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(view.goal.current_progress, 75.0);
        assert!(view.goal.achieved_at.is_none());
    }
}
