use axum::extract::State;
use serde::Deserialize;

use crate::db::{AppState, queries};
use crate::error::Result;
use crate::extractors::{Json, Query};
use crate::models::LeaderboardEntry;

pub const DEFAULT_LEADERBOARD_LIMIT: i64 = 10;
pub const MAX_LEADERBOARD_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    /// Kept as text so `?limit=abc` falls back to the default instead of failing.
    #[serde(default)]
    pub limit: Option<String>,
}

fn effective_limit(limit: Option<&str>) -> i64 {
    limit
        .and_then(|l| l.trim().parse::<i64>().ok())
        .filter(|l| *l > 0)
        .unwrap_or(DEFAULT_LEADERBOARD_LIMIT)
        .min(MAX_LEADERBOARD_LIMIT)
}

pub async fn leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<Vec<LeaderboardEntry>>> {
    let limit = effective_limit(query.limit.as_deref());
    let conn = state.db.get()?;

    let entries = queries::top_accounts(&conn, limit)?
        .into_iter()
        .map(LeaderboardEntry::from)
        .collect();

    Ok(Json(entries))
}
