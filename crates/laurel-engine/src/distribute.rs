use crate::rank::Ranking;
use chrono::NaiveDate;
use laurel_activity::UserProfile;
use laurel_economics::{cosmetic_item, EquipState, InventoryStore, RewardCatalog, WalletLedger};
use laurel_storage::StateStore;
use laurel_types::{
    ClaimKey, GroupGoalState, LeaderboardDefinition, LeaderboardId, RewardId, RewardKind,
    RewardPayout, UserId,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Result of one attempted mutation. Failures never roll back earlier
/// mutations; a retry of the whole pass repairs them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum OutcomeStatus {
    Applied,
    /// Idempotence no-op: the claim already existed or nothing had to move.
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct MutationOutcome {
    pub action: String,
    pub user: Option<UserId>,
    pub detail: String,
    pub status: OutcomeStatus,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DistributionReport {
    pub leaderboard: Option<LeaderboardId>,
    pub outcomes: Vec<MutationOutcome>,
}

impl DistributionReport {
    fn push(
        &mut self,
        action: &str,
        user: Option<&UserId>,
        detail: impl Into<String>,
        status: OutcomeStatus,
    ) {
        self.outcomes.push(MutationOutcome {
            action: action.to_string(),
            user: user.cloned(),
            detail: detail.into(),
            status,
        });
    }

    pub fn applied(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == OutcomeStatus::Applied)
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == OutcomeStatus::Skipped)
            .count()
    }

    pub fn failures(&self) -> Vec<&MutationOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, OutcomeStatus::Failed(_)))
            .collect()
    }
}

/// Cosmetic kinds a rank may receive. Only rank 1 carries the name effect;
/// every podium rank may carry title, message effect and decoration.
fn grantable_kinds(rank: u8) -> &'static [RewardKind] {
    if rank == 1 {
        &[
            RewardKind::Title,
            RewardKind::NameEffect,
            RewardKind::MessageEffect,
            RewardKind::Decoration,
        ]
    } else {
        &[
            RewardKind::Title,
            RewardKind::MessageEffect,
            RewardKind::Decoration,
        ]
    }
}

/// Applies ranking outcomes to wallet, inventory and equip state.
///
/// Every step converges under repetition: reward identities are derived, the
/// claim ledger bounds currency/item payouts, and revokes are no-ops when
/// nothing is held. Re-running against stale input is safe by construction.
pub struct RewardDistributor {
    store: Arc<StateStore>,
    wallet: Arc<dyn WalletLedger>,
    inventory: Arc<dyn InventoryStore>,
    equip: Arc<dyn EquipState>,
    catalog: Arc<dyn RewardCatalog>,
}

impl RewardDistributor {
    pub fn new(
        store: Arc<StateStore>,
        wallet: Arc<dyn WalletLedger>,
        inventory: Arc<dyn InventoryStore>,
        equip: Arc<dyn EquipState>,
        catalog: Arc<dyn RewardCatalog>,
    ) -> Self {
        Self {
            store,
            wallet,
            inventory,
            equip,
            catalog,
        }
    }

    pub async fn distribute(
        &self,
        definition: &LeaderboardDefinition,
        ranking: &Ranking,
        goal: &GroupGoalState,
        directory: &[UserProfile],
        today: NaiveDate,
    ) -> DistributionReport {
        let mut report = DistributionReport {
            leaderboard: Some(definition.id.clone()),
            ..Default::default()
        };

        let rank_rewards = self.refresh_catalog(definition, &mut report).await;
        let occupants = self.resolve_occupants(ranking, &mut report);

        self.converge_cosmetics(definition, &rank_rewards, &occupants, directory, &mut report)
            .await;

        if definition.podium_payout_enabled() {
            self.pay_podium(definition, &occupants, today, &mut report)
                .await;
        }

        if definition.group_goal_enabled() && definition.payout.is_payable() {
            self.pay_group_goal(definition, ranking, goal, &mut report)
                .await;
        }

        info!(
            leaderboard = %definition.id,
            applied = report.applied(),
            skipped = report.skipped(),
            failed = report.failures().len(),
            "🏆 Reward distribution pass complete"
        );
        report
    }

    /// Step 1: materialize (or refresh in place) the cosmetic reward
    /// definitions for ranks 1-3. Returns each rank's grantable reward ids.
    async fn refresh_catalog(
        &self,
        definition: &LeaderboardDefinition,
        report: &mut DistributionReport,
    ) -> [Vec<(RewardKind, RewardId)>; 3] {
        let mut rank_rewards: [Vec<(RewardKind, RewardId)>; 3] = Default::default();

        for rank in 1..=3u8 {
            for &kind in grantable_kinds(rank) {
                let Some(item) = cosmetic_item(definition, kind, rank) else {
                    continue;
                };
                match self.catalog.materialize(item).await {
                    Ok(id) => rank_rewards[rank as usize - 1].push((kind, id)),
                    Err(e) => report.push(
                        "materialize-reward",
                        None,
                        format!("{} rank {}", kind, rank),
                        OutcomeStatus::Failed(e.to_string()),
                    ),
                }
            }
        }

        rank_rewards
    }

    /// Step 2: resolve rank occupants. Empty, zero-value or unresolvable
    /// slots yield no occupant (and therefore only revokes).
    fn resolve_occupants(
        &self,
        ranking: &Ranking,
        report: &mut DistributionReport,
    ) -> [Option<UserId>; 3] {
        let mut occupants: [Option<UserId>; 3] = Default::default();

        for rank in 1..=3u8 {
            let Some(entry) = ranking.occupant(rank) else {
                continue;
            };
            match &entry.user {
                Some(user) => occupants[rank as usize - 1] = Some(user.clone()),
                None => report.push(
                    "resolve-occupant",
                    None,
                    format!("rank {} name '{}' not in directory", rank, entry.name),
                    OutcomeStatus::Failed("unresolved name".to_string()),
                ),
            }
        }

        occupants
    }

    /// Steps 3-4: bring every user's cosmetic holdings in line with the
    /// current podium. Wrong-rank and no-longer-ranked holdings are revoked
    /// (and unequipped); missing rank cosmetics are granted and auto-equipped.
    async fn converge_cosmetics(
        &self,
        definition: &LeaderboardDefinition,
        rank_rewards: &[Vec<(RewardKind, RewardId)>; 3],
        occupants: &[Option<UserId>; 3],
        directory: &[UserProfile],
        report: &mut DistributionReport,
    ) {
        let mut reward_index: HashMap<RewardId, (usize, RewardKind)> = HashMap::new();
        for (rank_idx, rewards) in rank_rewards.iter().enumerate() {
            for (kind, id) in rewards {
                reward_index.insert(*id, (rank_idx, *kind));
            }
        }

        // The universe of users whose holdings may need convergence: the
        // directory snapshot plus any occupant resolved from outside it.
        let mut universe: Vec<UserId> = directory
            .iter()
            .filter(|u| !u.is_admin)
            .map(|u| u.id.clone())
            .collect();
        for occupant in occupants.iter().flatten() {
            if !universe.contains(occupant) {
                universe.push(occupant.clone());
            }
        }

        for user in &universe {
            let assigned = occupants
                .iter()
                .position(|o| o.as_ref() == Some(user));

            let holdings = match self.inventory.holdings(user).await {
                Ok(holdings) => holdings,
                Err(e) => {
                    report.push(
                        "read-holdings",
                        Some(user),
                        definition.id.to_string(),
                        OutcomeStatus::Failed(e.to_string()),
                    );
                    continue;
                }
            };

            // Revoke holdings of this leaderboard that do not match the
            // user's current rank (including users off the podium entirely).
            for (held, qty) in &holdings {
                let Some((rank_idx, kind)) = reward_index.get(held) else {
                    continue;
                };
                if assigned == Some(*rank_idx) {
                    continue;
                }
                self.revoke_cosmetic(user, *held, *qty, *kind, report).await;
            }

            let Some(rank_idx) = assigned else {
                continue;
            };

            for (kind, id) in &rank_rewards[rank_idx] {
                let already_held = holdings.iter().any(|(held, qty)| held == id && *qty > 0);
                if already_held {
                    continue;
                }
                match self.inventory.grant(user, *id, 1).await {
                    Ok(()) => {
                        report.push(
                            "grant-cosmetic",
                            Some(user),
                            format!("{} rank {}", kind, rank_idx + 1),
                            OutcomeStatus::Applied,
                        );
                        // Newly granted cosmetics are worn immediately.
                        if let Some(slot) = kind.slot() {
                            if let Err(e) = self.equip.equip(user, *id, slot).await {
                                report.push(
                                    "equip-cosmetic",
                                    Some(user),
                                    slot.to_string(),
                                    OutcomeStatus::Failed(e.to_string()),
                                );
                            }
                        }
                    }
                    Err(e) => report.push(
                        "grant-cosmetic",
                        Some(user),
                        format!("{} rank {}", kind, rank_idx + 1),
                        OutcomeStatus::Failed(e.to_string()),
                    ),
                }
            }
        }
    }

    async fn revoke_cosmetic(
        &self,
        user: &UserId,
        id: RewardId,
        qty: u32,
        kind: RewardKind,
        report: &mut DistributionReport,
    ) {
        match self.inventory.revoke(user, id, qty).await {
            Ok(()) => {
                report.push(
                    "revoke-cosmetic",
                    Some(user),
                    kind.to_string(),
                    OutcomeStatus::Applied,
                );
                if let Some(slot) = kind.slot() {
                    match self.equip.equipped(user).await {
                        Ok(equipped) if equipped.get(&slot) == Some(&id) => {
                            if let Err(e) = self.equip.unequip(user, slot).await {
                                report.push(
                                    "unequip-cosmetic",
                                    Some(user),
                                    slot.to_string(),
                                    OutcomeStatus::Failed(e.to_string()),
                                );
                            }
                        }
                        Ok(_) => {}
                        Err(e) => report.push(
                            "read-equipped",
                            Some(user),
                            slot.to_string(),
                            OutcomeStatus::Failed(e.to_string()),
                        ),
                    }
                }
            }
            Err(e) => report.push(
                "revoke-cosmetic",
                Some(user),
                kind.to_string(),
                OutcomeStatus::Failed(e.to_string()),
            ),
        }
    }

    /// Step 5: currency/item podium payout, at most once per rank per day.
    async fn pay_podium(
        &self,
        definition: &LeaderboardDefinition,
        occupants: &[Option<UserId>; 3],
        today: NaiveDate,
        report: &mut DistributionReport,
    ) {
        for rank in 1..=3u8 {
            let Some(user) = &occupants[rank as usize - 1] else {
                continue;
            };

            let claim = ClaimKey::derive(
                &definition.id,
                rank,
                RewardKind::Podium,
                &definition.payout.amount_repr(),
                &today.format("%Y-%m-%d").to_string(),
            );

            match self.store.has_claim(&claim).await {
                Ok(true) => {
                    report.push(
                        "podium-payout",
                        Some(user),
                        format!("rank {} already paid today", rank),
                        OutcomeStatus::Skipped,
                    );
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    report.push(
                        "podium-payout",
                        Some(user),
                        format!("rank {}", rank),
                        OutcomeStatus::Failed(e.to_string()),
                    );
                    continue;
                }
            }

            let memo = format!("Podium reward: {} rank {}", definition.title, rank);
            match self.pay(user, &definition.payout, &memo).await {
                Ok(()) => {
                    report.push(
                        "podium-payout",
                        Some(user),
                        format!("rank {}", rank),
                        OutcomeStatus::Applied,
                    );
                    if let Err(e) = self.store.record_claim(&claim).await {
                        // The payout landed but the claim did not; the next
                        // pass may pay again within today's bound. Surface it.
                        warn!(
                            leaderboard = %definition.id,
                            rank = rank,
                            error = %e,
                            "⚠️ Podium claim could not be recorded"
                        );
                        report.push(
                            "record-claim",
                            Some(user),
                            format!("rank {}", rank),
                            OutcomeStatus::Failed(e.to_string()),
                        );
                    }
                }
                Err(e) => report.push(
                    "podium-payout",
                    Some(user),
                    format!("rank {}", rank),
                    OutcomeStatus::Failed(e.to_string()),
                ),
            }
        }
    }

    /// Step 6: group-goal payout, at most once per epoch, paid to every
    /// resolved contributor. Mutually exclusive with podium payouts.
    async fn pay_group_goal(
        &self,
        definition: &LeaderboardDefinition,
        ranking: &Ranking,
        goal: &GroupGoalState,
        report: &mut DistributionReport,
    ) {
        if goal.achieved_at.is_none() {
            return;
        }

        let claim = ClaimKey::derive(
            &definition.id,
            0,
            RewardKind::GroupGoal,
            &definition.payout.amount_repr(),
            &goal.epoch_repr(),
        );

        match self.store.has_claim(&claim).await {
            Ok(true) => {
                report.push(
                    "group-goal-payout",
                    None,
                    "already paid this epoch".to_string(),
                    OutcomeStatus::Skipped,
                );
                return;
            }
            Ok(false) => {}
            Err(e) => {
                report.push(
                    "group-goal-payout",
                    None,
                    goal.epoch_repr(),
                    OutcomeStatus::Failed(e.to_string()),
                );
                return;
            }
        }

        let memo = format!("Group goal reward: {}", definition.title);
        for entry in &ranking.entries {
            let Some(user) = &entry.user else {
                report.push(
                    "group-goal-payout",
                    None,
                    format!("contributor '{}' not in directory", entry.name),
                    OutcomeStatus::Failed("unresolved name".to_string()),
                );
                continue;
            };
            match self.pay(user, &definition.payout, &memo).await {
                Ok(()) => report.push(
                    "group-goal-payout",
                    Some(user),
                    goal.epoch_repr(),
                    OutcomeStatus::Applied,
                ),
                Err(e) => report.push(
                    "group-goal-payout",
                    Some(user),
                    goal.epoch_repr(),
                    OutcomeStatus::Failed(e.to_string()),
                ),
            }
        }

        // One claim guards the whole team payout for this epoch.
        if let Err(e) = self.store.record_claim(&claim).await {
            report.push(
                "record-claim",
                None,
                goal.epoch_repr(),
                OutcomeStatus::Failed(e.to_string()),
            );
        }
    }

    async fn pay(&self, user: &UserId, payout: &RewardPayout, memo: &str) -> anyhow::Result<()> {
        match payout {
            RewardPayout::Text => Ok(()),
            RewardPayout::Currency { amount } => self.wallet.credit(user, *amount, memo).await,
            RewardPayout::Item { item, qty } => {
                self.inventory
                    .grant(user, RewardId::for_item_ref(item), *qty)
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rank::rank;
    use chrono::NaiveDate;
    use laurel_economics::{MemoryCatalog, MemoryEquip, MemoryInventory, MemoryWallet};
    use laurel_storage::{ManualRankEntry, MemoryBackend, StateStore};
    use laurel_types::{Coins, MetricType, RankCosmetics};
    use std::collections::BTreeMap;

    fn distributor() -> (RewardDistributor, Arc<MemoryWallet>) {
        let store = Arc::new(StateStore::new(Arc::new(MemoryBackend::new())));
        let wallet = Arc::new(MemoryWallet::new());
        let distributor = RewardDistributor::new(
            store,
            wallet.clone(),
            Arc::new(MemoryInventory::new()),
            Arc::new(MemoryEquip::new()),
            Arc::new(MemoryCatalog::new()),
        );
        (distributor, wallet)
    }

    fn board() -> LeaderboardDefinition {
        LeaderboardDefinition::new(
            LeaderboardId::new("weekly"),
            "Weekly",
            MetricType::TotalQuantity,
        )
        .with_payout(RewardPayout::Currency {
            amount: Coins::new(10),
        })
        .with_cosmetics(
            1,
            RankCosmetics {
                title: Some("Champion".to_string()),
                ..Default::default()
            },
        )
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 6).unwrap()
    }

    #[tokio::test]
    async fn test_unresolved_occupant_is_reported_not_granted() {
        let (distributor, wallet) = distributor();
        let board = board();
        let directory = vec![UserProfile::new("alice", "Alice")];

        let manual = vec![ManualRankEntry::new(
            board.id.clone(),
            "m1",
            "Stranger",
            50.0,
        )];
        let ranking = rank(&board, &BTreeMap::new(), &manual, &directory);

        let report = distributor
            .distribute(&board, &ranking, &board.group_goal, &directory, today())
            .await;

        let failures = report.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].action, "resolve-occupant");

        // No payout landed anywhere.
        assert_eq!(
            wallet.balance(&UserId::new("Stranger")).await.unwrap(),
            Coins::ZERO
        );
        assert_eq!(
            wallet.balance(&UserId::new("alice")).await.unwrap(),
            Coins::ZERO
        );
    }

    #[tokio::test]
    async fn test_repeat_distribution_skips_podium_claim() {
        let (distributor, wallet) = distributor();
        let board = board();
        let directory = vec![UserProfile::new("alice", "Alice")];

        let manual = vec![ManualRankEntry::new(board.id.clone(), "m1", "Alice", 50.0)];
        let ranking = rank(&board, &BTreeMap::new(), &manual, &directory);

        let first = distributor
            .distribute(&board, &ranking, &board.group_goal, &directory, today())
            .await;
        assert!(first
            .outcomes
            .iter()
            .any(|o| o.action == "podium-payout" && o.status == OutcomeStatus::Applied));

        let second = distributor
            .distribute(&board, &ranking, &board.group_goal, &directory, today())
            .await;
        assert!(second
            .outcomes
            .iter()
            .any(|o| o.action == "podium-payout" && o.status == OutcomeStatus::Skipped));

        assert_eq!(
            wallet.balance(&UserId::new("alice")).await.unwrap(),
            Coins::new(10)
        );
    }
}
