use chrono::NaiveDate;
use laurel_types::{MetricType, UserId};
use std::collections::BTreeSet;

/// Running totals for one user inside one aggregation pass.
///
/// Recomputed from scratch every cycle and never persisted; re-derivation is
/// what makes concurrent recomputation safe.
#[derive(Debug, Clone, PartialEq)]
pub struct UserStat {
    pub user: UserId,
    pub display_name: String,
    pub target_sum: f64,
    pub actual_sum: f64,
    pub completed_items: u32,
    pub total_items: u32,
    pub quantity: f64,
    pub minutes: f64,
    pub posts: u32,
    pub departure_days: BTreeSet<NaiveDate>,
    pub return_days: BTreeSet<NaiveDate>,
    pub work_days: BTreeSet<NaiveDate>,
    pub late_count: u32,
}

impl UserStat {
    pub fn new(user: UserId, display_name: impl Into<String>) -> Self {
        Self {
            user,
            display_name: display_name.into(),
            target_sum: 0.0,
            actual_sum: 0.0,
            completed_items: 0,
            total_items: 0,
            quantity: 0.0,
            minutes: 0.0,
            posts: 0,
            departure_days: BTreeSet::new(),
            return_days: BTreeSet::new(),
            work_days: BTreeSet::new(),
            late_count: 0,
        }
    }

    /// Achieved / planned ratio in percent, 0 when nothing was planned.
    pub fn completion_rate(&self) -> f64 {
        if self.target_sum > 0.0 {
            100.0 * self.actual_sum / self.target_sum
        } else {
            0.0
        }
    }

    /// Departure and return assignments are tracked independently, then
    /// summed; each side is already de-duplicated per day.
    pub fn driver_count(&self) -> u32 {
        (self.departure_days.len() + self.return_days.len()) as u32
    }

    pub fn metric_value(&self, metric: MetricType) -> f64 {
        match metric {
            MetricType::CompletionRate => self.completion_rate(),
            MetricType::CompletedCount => self.completed_items as f64,
            MetricType::TotalWorkItems => self.work_days.len() as f64,
            MetricType::TotalQuantity => self.quantity,
            MetricType::TotalTime => self.minutes,
            MetricType::PostCount => self.posts as f64,
            MetricType::DriverCount => self.driver_count() as f64,
            MetricType::NoLateThisMonth => {
                if self.late_count == 0 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_rate() {
        let mut stat = UserStat::new(UserId::new("alice"), "Alice");
        assert_eq!(stat.completion_rate(), 0.0);

        stat.target_sum = 20.0;
        stat.actual_sum = 15.0;
        assert_eq!(stat.completion_rate(), 75.0);
    }

    #[test]
    fn test_driver_count_sums_directions() {
        let mut stat = UserStat::new(UserId::new("bob"), "Bob");
        let day = NaiveDate::from_ymd_opt(2026, 8, 10).unwrap();
        stat.departure_days.insert(day);
        stat.return_days.insert(day);
        assert_eq!(stat.metric_value(MetricType::DriverCount), 2.0);
    }

    #[test]
    fn test_no_late_is_binary() {
        let mut stat = UserStat::new(UserId::new("carol"), "Carol");
        assert_eq!(stat.metric_value(MetricType::NoLateThisMonth), 1.0);
        stat.late_count = 3;
        assert_eq!(stat.metric_value(MetricType::NoLateThisMonth), 0.0);
    }
}
