use axum::extract::State;
use serde::Deserialize;

use crate::db::{AppState, queries};
use crate::error::{OptionExt, Result, msg};
use crate::extractors::{Json, Path};
use crate::models::{Account, UpsertAccount};

use super::require_telegram_id;

/// Sent by the Mini App on launch with `initDataUnsafe.user`.
#[derive(Debug, Deserialize)]
pub struct UserRequest {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub async fn upsert_user(
    State(state): State<AppState>,
    Json(request): Json<UserRequest>,
) -> Result<Json<Account>> {
    let telegram_id = require_telegram_id(request.id)?;
    let conn = state.db.get()?;

    let account = queries::get_or_create_account(
        &conn,
        &UpsertAccount {
            telegram_id,
            username: non_empty(request.username),
            first_name: non_empty(request.first_name),
        },
    )?;

    Ok(Json(account))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(telegram_id): Path<i64>,
) -> Result<Json<Account>> {
    let conn = state.db.get()?;
    let account = queries::get_account(&conn, telegram_id)?.or_not_found(msg::ACCOUNT_NOT_FOUND)?;
    Ok(Json(account))
}
