//! Persistence for check-ins.
//!
//! The store is a thin mapping of typed calls onto a backing store. It does
//! no validation; that belongs to [`crate::services::check_in`]. The
//! definition of "today" lives here so every caller shares one day boundary.

use async_trait::async_trait;
use sqlx::error::ErrorKind;

use crate::models::check_in::{CheckIn, InsertedCheckIn, NewCheckIn};

pub mod memory;
pub mod postgres;

pub use memory::MemoryCheckInStore;
pub use postgres::PgCheckInStore;

#[async_trait]
pub trait CheckInStore: Send + Sync {
    /// Durably write a check-in and return the store-assigned fields.
    async fn insert(&self, check_in: &NewCheckIn) -> Result<InsertedCheckIn, StoreError>;

    /// Most recent check-in for `user_id` whose `checked_at` falls on the
    /// current calendar day in the store's reference time zone.
    async fn latest_today(&self, user_id: i64) -> Result<Option<CheckIn>, StoreError>;

    /// Up to `limit` check-ins for `user_id`, newest `checked_at` first,
    /// ties broken by descending id.
    async fn history(&self, user_id: i64, limit: i64) -> Result<Vec<CheckIn>, StoreError>;

    /// Verify the backing store is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(#[source] sqlx::Error),

    #[error("constraint violation: {0}")]
    ConstraintViolation(#[source] sqlx::Error),

    #[error("query failed: {0}")]
    Query(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => Self::Unavailable(e),
            sqlx::Error::Database(db)
                if matches!(
                    db.kind(),
                    ErrorKind::UniqueViolation
                        | ErrorKind::ForeignKeyViolation
                        | ErrorKind::NotNullViolation
                        | ErrorKind::CheckViolation
                ) =>
            {
                Self::ConstraintViolation(e)
            }
            _ => Self::Query(e),
        }
    }
}
