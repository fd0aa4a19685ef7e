use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::models::check_in::{CreateCheckInRequest, HistoryQuery};
use crate::services::check_in::parse_user_id;
use crate::AppState;

pub async fn create_check_in(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    body: Bytes,
) -> AppResult<(StatusCode, Json<Value>)> {
    // Decoded regardless of Content-Type.
    let body = match serde_json::from_slice::<CreateCheckInRequest>(&body) {
        Ok(body) => body,
        Err(e) => {
            // Identity errors take precedence over body errors.
            parse_user_id(&user_id)?;
            return Err(AppError::InvalidRequest(format!("Invalid request body: {e}")));
        }
    };

    let check_in = state.check_ins.submit(&user_id, body).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Check-in created successfully",
            "data": check_in,
        })),
    ))
}

pub async fn get_today_check_in(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<Value>> {
    let body = match state.check_ins.today(&user_id).await? {
        Some(check_in) => json!({
            "message": "check-in found",
            "data": check_in,
        }),
        None => json!({
            "message": "No check-in today",
            "data": null,
        }),
    };

    Ok(Json(body))
}

pub async fn get_check_in_history(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> AppResult<Json<Value>> {
    let Query(query) = query.map_err(|e| AppError::InvalidRequest(e.body_text()))?;
    let history = state
        .check_ins
        .history(&user_id, query.limit.as_deref())
        .await?;

    Ok(Json(json!({
        "message": "History retrieved successfully",
        "count": history.len(),
        "data": history,
    })))
}
