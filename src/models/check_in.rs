use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Default number of entries returned by a history query.
pub const DEFAULT_HISTORY_LIMIT: i64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckIn {
    pub id: i64,
    pub user_id: i64,
    pub check_in_type: CheckInKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_count: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_level: Option<i32>,
    pub checked_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckInKind {
    /// Triggered explicitly by the tracked person.
    Manual,
    /// Triggered by device activity.
    Passive,
}

impl CheckInKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Passive => "passive",
        }
    }
}

impl fmt::Display for CheckInKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("check_in_type must be one of: manual, passive (got {0:?})")]
pub struct UnknownKind(pub String);

impl FromStr for CheckInKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(Self::Manual),
            "passive" => Ok(Self::Passive),
            other => Err(UnknownKind(other.to_string())),
        }
    }
}

/// A check-in before the store has assigned `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCheckIn {
    pub user_id: i64,
    pub check_in_type: CheckInKind,
    pub step_count: Option<i32>,
    pub battery_level: Option<i32>,
    pub checked_at: DateTime<Utc>,
}

/// Fields assigned by the store on a durable write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct InsertedCheckIn {
    pub id: i64,
    pub created_at: DateTime<Utc>,
}

impl NewCheckIn {
    pub fn into_check_in(self, inserted: InsertedCheckIn) -> CheckIn {
        CheckIn {
            id: inserted.id,
            user_id: self.user_id,
            check_in_type: self.check_in_type,
            step_count: self.step_count,
            battery_level: self.battery_level,
            checked_at: self.checked_at,
            created_at: inserted.created_at,
        }
    }
}

/// Raw `check_ins` row. The kind column is plain text, so decoding into
/// [`CheckIn`] can fail per row.
#[derive(Debug, Clone, FromRow)]
pub struct CheckInRow {
    pub id: i64,
    pub user_id: i64,
    pub check_in_type: String,
    pub step_count: Option<i32>,
    pub battery_level: Option<i32>,
    pub checked_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<CheckInRow> for CheckIn {
    type Error = UnknownKind;

    fn try_from(row: CheckInRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            check_in_type: row.check_in_type.parse()?,
            step_count: row.step_count,
            battery_level: row.battery_level,
            checked_at: row.checked_at,
            created_at: row.created_at,
        })
    }
}

/// Body of `POST /api/v1/checkins/:userId`. The kind stays a string here so
/// an unknown value is reported by the service rather than the JSON decoder.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCheckInRequest {
    pub check_in_type: String,
    pub step_count: Option<i32>,
    pub battery_level: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<String>,
}
