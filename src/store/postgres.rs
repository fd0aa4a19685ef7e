use async_trait::async_trait;
use futures_util::TryStreamExt;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Row};

use super::{CheckInStore, StoreError};
use crate::models::check_in::{CheckIn, CheckInRow, InsertedCheckIn, NewCheckIn};

const SELECT_COLUMNS: &str =
    "id, user_id, check_in_type, step_count, battery_level, checked_at, created_at";

/// PostgreSQL-backed store. "Today" is `CURRENT_DATE` in the session time
/// zone, which the pool sets on connect.
#[derive(Clone)]
pub struct PgCheckInStore {
    pool: PgPool,
}

impl PgCheckInStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CheckInStore for PgCheckInStore {
    async fn insert(&self, check_in: &NewCheckIn) -> Result<InsertedCheckIn, StoreError> {
        let inserted = sqlx::query_as::<_, InsertedCheckIn>(
            r#"
            INSERT INTO check_ins (user_id, check_in_type, step_count, battery_level, checked_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, created_at
            "#,
        )
        .bind(check_in.user_id)
        .bind(check_in.check_in_type.as_str())
        .bind(check_in.step_count)
        .bind(check_in.battery_level)
        .bind(check_in.checked_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(inserted)
    }

    async fn latest_today(&self, user_id: i64) -> Result<Option<CheckIn>, StoreError> {
        let sql = format!(
            r#"
            SELECT {SELECT_COLUMNS}
            FROM check_ins
            WHERE user_id = $1 AND DATE(checked_at) = CURRENT_DATE
            ORDER BY checked_at DESC, id DESC
            "#
        );

        // First decodable row wins; a corrupt newer row must not hide an older valid one.
        let mut rows = sqlx::query(&sql).bind(user_id).fetch(&self.pool);
        while let Some(row) = rows.try_next().await? {
            if let Some(check_in) = decode_row(&row) {
                return Ok(Some(check_in));
            }
        }

        Ok(None)
    }

    async fn history(&self, user_id: i64, limit: i64) -> Result<Vec<CheckIn>, StoreError> {
        let sql = format!(
            r#"
            SELECT {SELECT_COLUMNS}
            FROM check_ins
            WHERE user_id = $1
            ORDER BY checked_at DESC, id DESC
            LIMIT $2
            "#
        );

        let mut history = Vec::new();
        let mut rows = sqlx::query(&sql).bind(user_id).bind(limit).fetch(&self.pool);
        while let Some(row) = rows.try_next().await? {
            if let Some(check_in) = decode_row(&row) {
                history.push(check_in);
            }
        }

        Ok(history)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}

/// Decode one row, logging and discarding it on failure.
fn decode_row(row: &PgRow) -> Option<CheckIn> {
    let decoded = CheckInRow::from_row(row)
        .map_err(|e| e.to_string())
        .and_then(|raw| CheckIn::try_from(raw).map_err(|e| e.to_string()));

    match decoded {
        Ok(check_in) => Some(check_in),
        Err(error) => {
            let id = row.try_get::<i64, _>("id").ok();
            tracing::warn!(error = %error, row_id = ?id, "Skipping undecodable check-in row");
            None
        }
    }
}
