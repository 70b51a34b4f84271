use axum::extract::State;
use serde::Deserialize;

use crate::db::{AppState, queries};
use crate::error::{AppError, OptionExt, Result, msg};
use crate::extractors::Json;
use crate::models::Account;

use super::require_telegram_id;

#[derive(Debug, Deserialize)]
pub struct ClickRequest {
    #[serde(default)]
    pub telegram_id: Option<i64>,
    /// Coins earned by this tap (batched taps send more than one).
    #[serde(default)]
    pub coins: Option<i64>,
}

/// Absent or zero means a single coin; negative would break the balance invariant.
fn coins_to_add(coins: Option<i64>) -> Result<i64> {
    match coins {
        None | Some(0) => Ok(1),
        Some(c) if c < 0 => Err(AppError::BadRequest(msg::NEGATIVE_COINS.into())),
        Some(c) => Ok(c),
    }
}

/// Every call counts; taps are not deduplicated.
pub async fn click(
    State(state): State<AppState>,
    Json(request): Json<ClickRequest>,
) -> Result<Json<Account>> {
    let telegram_id = require_telegram_id(request.telegram_id)?;
    let coins = coins_to_add(request.coins)?;

    let conn = state.db.get()?;
    let account = queries::increment_click(&conn, telegram_id, coins)?
        .or_not_found(msg::ACCOUNT_NOT_FOUND)?;

    Ok(Json(account))
}
