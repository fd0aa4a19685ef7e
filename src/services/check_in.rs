//! Check-in business rules: identity parsing, kind validation, server-side
//! event time and history limits. All validation runs before the store is
//! touched.

use std::sync::Arc;

use chrono::{SubsecRound, Utc};

use crate::error::{AppError, AppResult};
use crate::models::check_in::{
    CheckIn, CheckInKind, CreateCheckInRequest, NewCheckIn, DEFAULT_HISTORY_LIMIT,
};
use crate::store::CheckInStore;

#[derive(Clone)]
pub struct CheckInService {
    store: Arc<dyn CheckInStore>,
    max_history_limit: i64,
}

impl CheckInService {
    pub fn new(store: Arc<dyn CheckInStore>, max_history_limit: i64) -> Self {
        Self {
            store,
            max_history_limit,
        }
    }

    pub async fn submit(&self, raw_user_id: &str, req: CreateCheckInRequest) -> AppResult<CheckIn> {
        let user_id = parse_user_id(raw_user_id)?;
        let kind = req
            .check_in_type
            .parse::<CheckInKind>()
            .map_err(|e| AppError::InvalidRequest(e.to_string()))?;

        // Postgres keeps microseconds; truncate so the stored and returned values agree.
        let new = NewCheckIn {
            user_id,
            check_in_type: kind,
            step_count: req.step_count,
            battery_level: req.battery_level,
            checked_at: Utc::now().trunc_subsecs(6),
        };

        let inserted = self.store.insert(&new).await?;
        let check_in = new.into_check_in(inserted);

        tracing::info!(
            user_id = check_in.user_id,
            check_in_id = check_in.id,
            kind = %check_in.check_in_type,
            "Check-in recorded"
        );

        Ok(check_in)
    }

    pub async fn today(&self, raw_user_id: &str) -> AppResult<Option<CheckIn>> {
        let user_id = parse_user_id(raw_user_id)?;
        Ok(self.store.latest_today(user_id).await?)
    }

    pub async fn history(&self, raw_user_id: &str, limit: Option<&str>) -> AppResult<Vec<CheckIn>> {
        let user_id = parse_user_id(raw_user_id)?;
        let limit = self.resolve_limit(limit)?;
        Ok(self.store.history(user_id, limit).await?)
    }

    pub async fn ping(&self) -> AppResult<()> {
        Ok(self.store.ping().await?)
    }

    fn resolve_limit(&self, raw: Option<&str>) -> AppResult<i64> {
        let Some(raw) = raw else {
            return Ok(DEFAULT_HISTORY_LIMIT.min(self.max_history_limit));
        };

        let limit: i64 = raw
            .trim()
            .parse()
            .map_err(|_| AppError::InvalidRequest(format!("invalid limit: {raw}")))?;
        if limit < 0 {
            return Err(AppError::InvalidRequest(format!("invalid limit: {raw}")));
        }

        if limit > self.max_history_limit {
            tracing::debug!(requested = limit, max = self.max_history_limit, "Clamping history limit");
        }
        Ok(limit.min(self.max_history_limit))
    }
}

/// User ids are non-negative decimal integers. Signs and whitespace are rejected.
pub fn parse_user_id(raw: &str) -> AppResult<i64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::InvalidIdentity(raw.to_string()));
    }
    raw.parse()
        .map_err(|_| AppError::InvalidIdentity(raw.to_string()))
}
