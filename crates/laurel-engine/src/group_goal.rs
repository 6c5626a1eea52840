use chrono::{DateTime, Utc};
use laurel_storage::ManualRankEntry;
use laurel_types::{GroupGoalState, LeaderboardDefinition};
use tracing::info;

/// Recompute cumulative team progress for one leaderboard.
///
/// Only group-goal boards with metric total-quantity and a positive target
/// participate; anything else keeps its state untouched (a malformed target
/// silently disables the feature instead of failing the pass).
pub fn update_group_goal(
    definition: &LeaderboardDefinition,
    manual: &[ManualRankEntry],
    now: DateTime<Utc>,
) -> GroupGoalState {
    let mut state = definition.group_goal.clone();

    if !definition.group_goal_enabled() {
        return state;
    }

    // Once an epoch begins, only amounts accrued within it count; lifetime
    // quantities keep accumulating but no longer feed progress.
    state.current_progress = if state.last_reset_at.is_none() {
        manual.iter().map(|e| e.quantity).sum()
    } else {
        manual.iter().map(|e| e.period_quantity).sum()
    };

    if state.achieved_at.is_none() && state.current_progress >= definition.group_goal_target {
        state.achieved_at = Some(now);
        info!(
            leaderboard = %definition.id,
            progress = state.current_progress,
            target = definition.group_goal_target,
            "🎯 Group goal achieved"
        );
    }

    state
}

/// Begin a new epoch: zero every entry's period amount, clear progress and
/// achievement, stamp the reset time. Lifetime quantities are untouched.
pub fn apply_reset(
    entries: &mut [ManualRankEntry],
    now: DateTime<Utc>,
) -> GroupGoalState {
    for entry in entries.iter_mut() {
        entry.period_quantity = 0.0;
    }
    GroupGoalState {
        current_progress: 0.0,
        achieved_at: None,
        last_reset_at: Some(now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use laurel_types::{LeaderboardId, MetricType};

    fn goal_board(target: f64) -> LeaderboardDefinition {
        LeaderboardDefinition::new(
            LeaderboardId::new("team"),
            "Team goal",
            MetricType::TotalQuantity,
        )
        .with_group_goal(target)
    }

    fn entry(id: &str, quantity: f64, period: f64) -> ManualRankEntry {
        ManualRankEntry::new(LeaderboardId::new("team"), id, id, quantity)
            .with_period_quantity(period)
    }

    #[test]
    fn test_lifetime_progress_before_first_reset() {
        let board = goal_board(100.0);
        let manual = vec![entry("a", 70.0, 0.0), entry("b", 50.0, 0.0)];

        let state = update_group_goal(&board, &manual, Utc::now());
        assert_eq!(state.current_progress, 120.0);
        assert!(state.achieved_at.is_some());
    }

    #[test]
    fn test_epoch_scoped_progress_after_reset() {
        let mut board = goal_board(100.0);
        let mut manual = vec![entry("a", 70.0, 70.0), entry("b", 50.0, 50.0)];

        board.group_goal = apply_reset(&mut manual, Utc::now());
        assert_eq!(board.group_goal.current_progress, 0.0);
        assert!(board.group_goal.achieved_at.is_none());
        // Lifetime quantities survive the reset.
        assert_eq!(manual[0].quantity, 70.0);
        assert_eq!(manual[0].period_quantity, 0.0);

        // Progress stays at zero even though lifetime totals still sum
        // past the target.
        let state = update_group_goal(&board, &manual, Utc::now());
        assert_eq!(state.current_progress, 0.0);
        assert!(state.achieved_at.is_none());

        // New accrual inside the epoch counts, and the goal can be achieved
        // again in this epoch.
        manual[0].period_quantity = 80.0;
        manual[1].period_quantity = 25.0;
        let state = update_group_goal(&board, &manual, Utc::now());
        assert_eq!(state.current_progress, 105.0);
        assert!(state.achieved_at.is_some());
    }

    #[test]
    fn test_achievement_is_sticky_within_epoch() {
        let mut board = goal_board(100.0);
        let manual = vec![entry("a", 120.0, 0.0)];

        let first = update_group_goal(&board, &manual, Utc::now());
        let achieved = first.achieved_at;
        board.group_goal = first;

        // A later pass must not move the achievement timestamp.
        let second = update_group_goal(&board, &manual, Utc::now());
        assert_eq!(second.achieved_at, achieved);
    }

    #[test]
    fn test_invalid_target_disables_feature() {
        let board = goal_board(0.0);
        let manual = vec![entry("a", 500.0, 0.0)];

        let state = update_group_goal(&board, &manual, Utc::now());
        assert_eq!(state, board.group_goal);
        assert!(state.achieved_at.is_none());
    }
}
