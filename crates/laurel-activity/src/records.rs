use chrono::{DateTime, NaiveDate, Utc};
use laurel_types::UserId;
use serde::{Deserialize, Serialize};

/// One person's share of a work item. Multi-assignee items carry one
/// assignment per collaborator with that collaborator's own planned/achieved
/// split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub user: UserId,
    pub target: f64,
    pub actual: f64,
}

impl Assignment {
    pub fn new(user: impl Into<UserId>, target: f64, actual: f64) -> Self {
        Self {
            user: user.into(),
            target,
            actual,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.target > 0.0 && self.actual >= self.target
    }
}

impl<T: Into<UserId>> From<(T, f64, f64)> for Assignment {
    fn from((user, target, actual): (T, f64, f64)) -> Self {
        Self::new(user, target, actual)
    }
}

/// Scheduled work item produced by the external scheduling module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItemRecord {
    pub category: String,
    pub date: NaiveDate,
    pub assignees: Vec<Assignment>,
}

/// Message/post fact produced by the external messaging module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub author: UserId,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DriveDirection {
    Departure,
    Return,
}

/// Driving assignment attached to a scheduled trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriveRecord {
    pub driver: UserId,
    pub date: NaiveDate,
    pub direction: DriveDirection,
}

/// Normalized activity fact, one variant per uncoordinated source.
///
/// Immutable and read-only to the engine; the aggregator consumes this one
/// shape regardless of origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ActivityRecord {
    WorkItem(WorkItemRecord),
    Post(PostRecord),
    Drive(DriveRecord),
}

impl ActivityRecord {
    pub fn work_item(
        category: impl Into<String>,
        date: NaiveDate,
        assignees: Vec<Assignment>,
    ) -> Self {
        Self::WorkItem(WorkItemRecord {
            category: category.into(),
            date,
            assignees,
        })
    }

    pub fn post(author: impl Into<UserId>, timestamp: DateTime<Utc>) -> Self {
        Self::Post(PostRecord {
            author: author.into(),
            timestamp,
        })
    }

    pub fn drive(driver: impl Into<UserId>, date: NaiveDate, direction: DriveDirection) -> Self {
        Self::Drive(DriveRecord {
            driver: driver.into(),
            date,
            direction,
        })
    }

    /// Identities this record credits.
    pub fn subjects(&self) -> Vec<&UserId> {
        match self {
            Self::WorkItem(item) => item.assignees.iter().map(|a| &a.user).collect(),
            Self::Post(post) => vec![&post.author],
            Self::Drive(drive) => vec![&drive.driver],
        }
    }
}
