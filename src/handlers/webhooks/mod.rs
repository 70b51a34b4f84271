pub mod telegram;

pub use telegram::handle_telegram_webhook;

use axum::{Router, routing::post};

use crate::db::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/webhook", post(handle_telegram_webhook))
}
