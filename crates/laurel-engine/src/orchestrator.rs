use crate::aggregate::aggregate;
use crate::distribute::DistributionReport;
use crate::group_goal::update_group_goal;
use crate::rank::{rank, Ranking};
use crate::RankingEngine;
use anyhow::Result;
use chrono::{NaiveDate, Utc};
use laurel_storage::StorageError;
use laurel_types::{GroupGoalState, LeaderboardDefinition, LeaderboardId};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Summary of one full recomputation pass.
#[derive(Debug, Default)]
pub struct PassReport {
    pub processed: usize,
    pub skipped: usize,
    pub reports: Vec<DistributionReport>,
}

/// Current display state of one leaderboard.
#[derive(Debug, Clone)]
pub struct BoardView {
    pub definition: LeaderboardDefinition,
    pub ranking: Ranking,
    pub goal: GroupGoalState,
}

impl RankingEngine {
    /// Run one pass over every live definition: aggregate, rank, update the
    /// group goal, distribute rewards.
    ///
    /// Per-leaderboard problems never abort the loop; definitions deleted
    /// by another session mid-pass are skipped silently.
    pub async fn recompute_all(&self, today: NaiveDate) -> Result<PassReport> {
        let mut pass = PassReport::default();

        // Degraded reads still produce a best-effort pass.
        let users = match self.directory_source().users().await {
            Ok(users) => users,
            Err(e) => {
                warn!(error = %e, "⚠️ User directory unavailable, proceeding with empty snapshot");
                Vec::new()
            }
        };
        let records = match self.activity_source().records().await {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "⚠️ Activity sources unavailable, proceeding with no records");
                Vec::new()
            }
        };

        let definitions = self.store().list_definitions().await?;

        for stale in definitions {
            // Re-read right before acting: another session may have deleted
            // the board since the listing.
            let definition = match self.store().get_definition(&stale.id).await {
                Ok(Some(definition)) => definition,
                Ok(None) => {
                    debug!(leaderboard = %stale.id, "Definition vanished mid-pass, skipping");
                    pass.skipped += 1;
                    continue;
                }
                Err(e) => {
                    warn!(leaderboard = %stale.id, error = %e, "Definition re-read failed, skipping");
                    pass.skipped += 1;
                    continue;
                }
            };

            let manual = match self.store().manual_entries(&definition.id).await {
                Ok(manual) => manual,
                Err(e) => {
                    warn!(leaderboard = %definition.id, error = %e, "Manual entries unreadable, treating as empty");
                    Vec::new()
                }
            };

            // Manual boards bypass metric aggregation entirely.
            let stats = if definition.is_manual {
                BTreeMap::new()
            } else {
                aggregate(&definition, &users, &records, &manual, today)
            };

            let ranking = rank(&definition, &stats, &manual, &users);

            let goal = update_group_goal(&definition, &manual, Utc::now());
            let definition = self
                .persist_goal_state(definition, goal.clone())
                .await;

            let report = self
                .distributor()
                .distribute(&definition, &ranking, &goal, &users, today)
                .await;

            pass.processed += 1;
            pass.reports.push(report);
        }

        info!(
            processed = pass.processed,
            skipped = pass.skipped,
            "🔄 Recomputation pass finished"
        );
        Ok(pass)
    }

    /// Recompute a single leaderboard; absent/tombstoned ids are a no-op.
    pub async fn recompute(&self, id: &LeaderboardId, today: NaiveDate) -> Result<Option<DistributionReport>> {
        let Some(definition) = self.store().get_definition(id).await? else {
            return Ok(None);
        };

        let users = self.directory_source().users().await.unwrap_or_default();
        let records = self.activity_source().records().await.unwrap_or_default();
        let manual = self.store().manual_entries(id).await?;

        let stats = if definition.is_manual {
            BTreeMap::new()
        } else {
            aggregate(&definition, &users, &records, &manual, today)
        };
        let ranking = rank(&definition, &stats, &manual, &users);

        let goal = update_group_goal(&definition, &manual, Utc::now());
        let definition = self.persist_goal_state(definition, goal.clone()).await;

        let report = self
            .distributor()
            .distribute(&definition, &ranking, &goal, &users, today)
            .await;
        Ok(Some(report))
    }

    /// Side-effect-free view for display: ordered ranking, top-3 and
    /// group-goal progress.
    pub async fn current_ranking(
        &self,
        id: &LeaderboardId,
        today: NaiveDate,
    ) -> Result<Option<BoardView>> {
        let Some(definition) = self.store().get_definition(id).await? else {
            return Ok(None);
        };

        let users = self.directory_source().users().await.unwrap_or_default();
        let records = self.activity_source().records().await.unwrap_or_default();
        let manual = self.store().manual_entries(id).await?;

        let stats = if definition.is_manual {
            BTreeMap::new()
        } else {
            aggregate(&definition, &users, &records, &manual, today)
        };
        let ranking = rank(&definition, &stats, &manual, &users);
        let goal = update_group_goal(&definition, &manual, Utc::now());

        Ok(Some(BoardView {
            definition,
            ranking,
            goal,
        }))
    }

    /// Persist a changed goal state, tolerating a concurrent delete.
    async fn persist_goal_state(
        &self,
        mut definition: LeaderboardDefinition,
        goal: GroupGoalState,
    ) -> LeaderboardDefinition {
        if definition.group_goal == goal {
            return definition;
        }

        definition.group_goal = goal;
        match self.store().upsert_definition(definition.clone()).await {
            Ok(()) => {}
            Err(StorageError::Tombstoned(id)) => {
                debug!(leaderboard = %id, "Board deleted while updating goal state, skipping write");
            }
            Err(e) => {
                warn!(leaderboard = %definition.id, error = %e, "Goal state write failed");
            }
        }
        definition
    }
}
