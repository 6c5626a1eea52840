use crate::records::ActivityRecord;
use anyhow::Result;
use async_trait::async_trait;
use laurel_types::UserId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Directory row as handed out by the external user/profile service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub display_name: String,
    pub is_admin: bool,
}

impl UserProfile {
    pub fn new(id: impl Into<UserId>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            is_admin: false,
        }
    }

    pub fn admin(id: impl Into<UserId>, display_name: impl Into<String>) -> Self {
        Self {
            is_admin: true,
            ..Self::new(id, display_name)
        }
    }
}

/// Read-only accessor over the external user directory.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn users(&self) -> Result<Vec<UserProfile>>;
}

/// Read-only accessor over the external activity producers, already
/// normalized to [`ActivityRecord`].
#[async_trait]
pub trait ActivitySource: Send + Sync {
    async fn records(&self) -> Result<Vec<ActivityRecord>>;
}

/// In-memory directory for tests and local runs.
pub struct MemoryDirectory {
    users: Arc<RwLock<Vec<UserProfile>>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn add(&self, profile: UserProfile) {
        self.users.write().await.push(profile);
    }
}

impl Default for MemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserDirectory for MemoryDirectory {
    async fn users(&self) -> Result<Vec<UserProfile>> {
        Ok(self.users.read().await.clone())
    }
}

/// In-memory activity log for tests and local runs.
pub struct MemoryActivityLog {
    records: Arc<RwLock<Vec<ActivityRecord>>>,
}

impl MemoryActivityLog {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn push(&self, record: ActivityRecord) {
        self.records.write().await.push(record);
    }

    pub async fn extend(&self, records: impl IntoIterator<Item = ActivityRecord>) {
        self.records.write().await.extend(records);
    }

    pub async fn clear(&self) {
        self.records.write().await.clear();
    }
}

impl Default for MemoryActivityLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ActivitySource for MemoryActivityLog {
    async fn records(&self) -> Result<Vec<ActivityRecord>> {
        Ok(self.records.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_memory_fixtures() {
        let directory = MemoryDirectory::new();
        directory.add(UserProfile::new("alice", "Alice")).await;
        directory.add(UserProfile::admin("root", "Root")).await;

        let users = directory.users().await.unwrap();
        assert_eq!(users.len(), 2);
        assert!(users[1].is_admin);

        let log = MemoryActivityLog::new();
        log.push(ActivityRecord::post("alice", Utc::now())).await;
        assert_eq!(log.records().await.unwrap().len(), 1);

        log.clear().await;
        assert!(log.records().await.unwrap().is_empty());
    }
}
