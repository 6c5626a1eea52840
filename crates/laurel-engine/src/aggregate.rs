use crate::stats::UserStat;
use chrono::{Datelike, NaiveDate};
use laurel_activity::{ActivityRecord, UserProfile};
use laurel_storage::ManualRankEntry;
use laurel_types::{LeaderboardDefinition, MetricType, UserId};
use std::collections::{BTreeMap, HashSet};

/// Keyword filter over work-item categories.
///
/// Comma-separated keywords, OR semantics, case-sensitive substring in either
/// direction: a record matches when any keyword is contained in its category
/// or the category is contained in the keyword. An absent/empty filter
/// matches everything.
pub fn matches_filter(category: &str, filter: Option<&str>) -> bool {
    let Some(filter) = filter else {
        return true;
    };
    if filter.trim().is_empty() {
        return true;
    }

    filter
        .split(',')
        .map(str::trim)
        .filter(|kw| !kw.is_empty())
        .any(|kw| category.contains(kw) || kw.contains(category))
}

/// Fold activity records into per-user statistics for one leaderboard.
///
/// Pure over its inputs; callers re-run it freely on every trigger.
pub fn aggregate(
    definition: &LeaderboardDefinition,
    users: &[UserProfile],
    records: &[ActivityRecord],
    manual: &[ManualRankEntry],
    today: NaiveDate,
) -> BTreeMap<UserId, UserStat> {
    let admins: HashSet<&UserId> = users
        .iter()
        .filter(|u| u.is_admin)
        .map(|u| &u.id)
        .collect();

    let mut stats: BTreeMap<UserId, UserStat> = BTreeMap::new();

    // Seed every non-admin directory user.
    for user in users {
        if !user.is_admin {
            stats.insert(
                user.id.clone(),
                UserStat::new(user.id.clone(), user.display_name.clone()),
            );
        }
    }

    // Identities known only from activity must not be dropped; they get a
    // row keyed (and labeled) by their raw id.
    let mut seed = |user: &UserId, stats: &mut BTreeMap<UserId, UserStat>| {
        if !admins.contains(user) && !stats.contains_key(user) {
            stats.insert(
                user.clone(),
                UserStat::new(user.clone(), user.as_str().to_string()),
            );
        }
    };

    for record in records {
        for subject in record.subjects() {
            seed(subject, &mut stats);
        }
    }

    // Manual entries carry display names; names absent from the directory
    // still get a row keyed by the raw name.
    for entry in manual {
        let resolved = users
            .iter()
            .find(|u| u.display_name == entry.name)
            .map(|u| u.id.clone())
            .unwrap_or_else(|| UserId::new(entry.name.clone()));
        seed(&resolved, &mut stats);
    }

    let filter = definition.activity_filter.as_deref();

    for record in records {
        match record {
            ActivityRecord::WorkItem(item) => {
                if !matches_filter(&item.category, filter) {
                    continue;
                }

                let in_current_month = item.date.year() == today.year()
                    && item.date.month() == today.month();

                for assignment in &item.assignees {
                    if admins.contains(&assignment.user) {
                        continue;
                    }
                    let Some(stat) = stats.get_mut(&assignment.user) else {
                        continue;
                    };

                    // Late marks look at the calendar month, not the cutoff.
                    if definition.metric == MetricType::NoLateThisMonth && in_current_month {
                        stat.late_count += 1;
                    }

                    // Past-dated schedule entries do not retroactively
                    // change rankings.
                    if item.date < today {
                        continue;
                    }

                    stat.target_sum += assignment.target;
                    stat.actual_sum += assignment.actual;
                    stat.total_items += 1;
                    stat.quantity += assignment.actual;
                    stat.work_days.insert(item.date);
                    if assignment.is_completed() {
                        stat.completed_items += 1;
                    }
                }
            }
            ActivityRecord::Post(post) => {
                if admins.contains(&post.author) {
                    continue;
                }
                if let Some(stat) = stats.get_mut(&post.author) {
                    stat.posts += 1;
                }
            }
            ActivityRecord::Drive(drive) => {
                if admins.contains(&drive.driver) || drive.date < today {
                    continue;
                }
                if let Some(stat) = stats.get_mut(&drive.driver) {
                    // Same driver, date and direction collapses to one.
                    match drive.direction {
                        laurel_activity::DriveDirection::Departure => {
                            stat.departure_days.insert(drive.date);
                        }
                        laurel_activity::DriveDirection::Return => {
                            stat.return_days.insert(drive.date);
                        }
                    }
                }
            }
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use laurel_activity::{Assignment, DriveDirection};
    use laurel_types::LeaderboardId;

    fn board(metric: MetricType) -> LeaderboardDefinition {
        LeaderboardDefinition::new(LeaderboardId::new("b"), "Board", metric)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, d).unwrap()
    }

    fn directory() -> Vec<UserProfile> {
        vec![
            UserProfile::new("alice", "Alice"),
            UserProfile::new("bob", "Bob"),
            UserProfile::admin("root", "Root"),
        ]
    }

    #[test]
    fn test_filter_semantics() {
        assert!(matches_filter("anything", None));
        assert!(matches_filter("anything", Some("")));
        assert!(matches_filter("weeding north field", Some("weeding")));
        // Either containment direction counts.
        assert!(matches_filter("weed", Some("weeding")));
        assert!(matches_filter("harvest", Some("weeding, harvest")));
        assert!(!matches_filter("harvest", Some("weeding")));
        // Case-sensitive on purpose.
        assert!(!matches_filter("Harvest", Some("harvest, Weeding")));
    }

    #[test]
    fn test_admins_are_excluded() {
        let board = board(MetricType::PostCount);
        let records = vec![
            ActivityRecord::post("alice", Utc::now()),
            ActivityRecord::post("root", Utc::now()),
        ];

        let stats = aggregate(&board, &directory(), &records, &[], day(6));
        assert!(stats.contains_key(&UserId::new("alice")));
        assert!(!stats.contains_key(&UserId::new("root")));
        assert_eq!(stats[&UserId::new("alice")].posts, 1);
    }

    #[test]
    fn test_unknown_contributor_gets_row() {
        let board = board(MetricType::PostCount);
        let records = vec![ActivityRecord::post("ghost-42", Utc::now())];

        let stats = aggregate(&board, &directory(), &records, &[], day(6));
        let ghost = &stats[&UserId::new("ghost-42")];
        assert_eq!(ghost.display_name, "ghost-42");
        assert_eq!(ghost.posts, 1);
    }

    #[test]
    fn test_past_work_items_excluded() {
        let board = board(MetricType::TotalQuantity);
        let records = vec![
            ActivityRecord::work_item("harvest", day(5), vec![Assignment::new("alice", 5.0, 5.0)]),
            ActivityRecord::work_item("harvest", day(7), vec![Assignment::new("alice", 5.0, 4.0)]),
        ];

        let stats = aggregate(&board, &directory(), &records, &[], day(6));
        assert_eq!(stats[&UserId::new("alice")].quantity, 4.0);
        assert_eq!(stats[&UserId::new("alice")].total_items, 1);
    }

    #[test]
    fn test_collaborators_credited_with_own_split() {
        let board = board(MetricType::CompletionRate);
        let records = vec![ActivityRecord::work_item(
            "harvest",
            day(10),
            vec![
                Assignment::new("alice", 10.0, 10.0),
                Assignment::new("bob", 10.0, 5.0),
            ],
        )];

        let stats = aggregate(&board, &directory(), &records, &[], day(6));
        assert_eq!(stats[&UserId::new("alice")].completion_rate(), 100.0);
        assert_eq!(stats[&UserId::new("bob")].completion_rate(), 50.0);
        assert_eq!(stats[&UserId::new("alice")].completed_items, 1);
        assert_eq!(stats[&UserId::new("bob")].completed_items, 0);
    }

    #[test]
    fn test_driver_same_day_same_direction_collapses() {
        let board = board(MetricType::DriverCount);
        let records = vec![
            ActivityRecord::drive("bob", day(10), DriveDirection::Departure),
            ActivityRecord::drive("bob", day(10), DriveDirection::Departure),
            ActivityRecord::drive("bob", day(10), DriveDirection::Return),
            ActivityRecord::drive("bob", day(11), DriveDirection::Departure),
        ];

        let stats = aggregate(&board, &directory(), &records, &[], day(6));
        assert_eq!(stats[&UserId::new("bob")].driver_count(), 3);
    }

    #[test]
    fn test_late_marks_follow_calendar_month() {
        let board = board(MetricType::NoLateThisMonth).with_filter("late");
        let records = vec![
            // In the current month but before today: still a late mark.
            ActivityRecord::work_item("late", day(2), vec![Assignment::new("alice", 1.0, 0.0)]),
            // Previous month: ignored.
            ActivityRecord::work_item(
                "late",
                NaiveDate::from_ymd_opt(2026, 7, 30).unwrap(),
                vec![Assignment::new("bob", 1.0, 0.0)],
            ),
        ];

        let stats = aggregate(&board, &directory(), &records, &[], day(6));
        assert_eq!(stats[&UserId::new("alice")].late_count, 1);
        assert_eq!(stats[&UserId::new("bob")].late_count, 0);
    }

    #[test]
    fn test_manual_name_seeds_row() {
        let board = board(MetricType::TotalQuantity);
        let manual = vec![ManualRankEntry::new(
            LeaderboardId::new("b"),
            "m1",
            "Visitor",
            12.0,
        )];

        let stats = aggregate(&board, &directory(), &[], &manual, day(6));
        assert!(stats.contains_key(&UserId::new("Visitor")));
    }
}
