use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{CheckInStore, StoreError};
use crate::models::check_in::{CheckIn, InsertedCheckIn, NewCheckIn};

/// Process-local store for development and tests. Contents are lost on
/// restart. "Today" is the current UTC calendar day.
#[derive(Clone, Default)]
pub struct MemoryCheckInStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    rows: Vec<CheckIn>,
    last_id: i64,
}

impl MemoryCheckInStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored check-ins across all users.
    pub async fn len(&self) -> usize {
        self.inner.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CheckInStore for MemoryCheckInStore {
    async fn insert(&self, check_in: &NewCheckIn) -> Result<InsertedCheckIn, StoreError> {
        let mut inner = self.inner.write().await;
        inner.last_id += 1;

        let inserted = InsertedCheckIn {
            id: inner.last_id,
            created_at: Utc::now(),
        };
        inner.rows.push(check_in.clone().into_check_in(inserted));

        Ok(inserted)
    }

    async fn latest_today(&self, user_id: i64) -> Result<Option<CheckIn>, StoreError> {
        let today = Utc::now().date_naive();
        let inner = self.inner.read().await;

        Ok(inner
            .rows
            .iter()
            .filter(|c| c.user_id == user_id && c.checked_at.date_naive() == today)
            .max_by_key(|c| (c.checked_at, c.id))
            .cloned())
    }

    async fn history(&self, user_id: i64, limit: i64) -> Result<Vec<CheckIn>, StoreError> {
        let limit = usize::try_from(limit).unwrap_or(0);
        let inner = self.inner.read().await;

        let mut history: Vec<CheckIn> = inner
            .rows
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        history.sort_by(|a, b| (b.checked_at, b.id).cmp(&(a.checked_at, a.id)));
        history.truncate(limit);

        Ok(history)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
