use serde::{Deserialize, Serialize};

/// A player, keyed by their Telegram user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Internal row id; records insertion order for leaderboard ties.
    pub id: i64,
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub coins: i64,
    pub total_clicks: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Public projection of an account for the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub coins: i64,
    pub total_clicks: i64,
}

impl From<Account> for LeaderboardEntry {
    fn from(account: Account) -> Self {
        Self {
            telegram_id: account.telegram_id,
            username: account.username,
            first_name: account.first_name,
            coins: account.coins,
            total_clicks: account.total_clicks,
        }
    }
}

/// Identity hints sent by the Mini App (or taken from a webhook `from` field).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpsertAccount {
    pub telegram_id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
}
