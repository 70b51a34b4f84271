mod click;
mod leaderboard;
mod payments;
mod users;

pub use click::*;
pub use leaderboard::*;
pub use payments::*;
pub use users::*;

use axum::{Json, Router, routing::{get, post}};
use serde::Serialize;

use crate::db::AppState;
use crate::error::{AppError, Result, msg};

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Telegram never issues user id 0, and the Mini App sends `null` when it has no user.
fn require_telegram_id(id: Option<i64>) -> Result<i64> {
    id.filter(|id| *id != 0)
        .ok_or_else(|| AppError::BadRequest(msg::TELEGRAM_ID_REQUIRED.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/user", post(upsert_user))
        .route("/api/user/{telegram_id}", get(get_user))
        .route("/api/click", post(click))
        .route("/api/leaderboard", get(leaderboard))
        .route("/api/payment/create-invoice", post(create_invoice))
        .route("/api/payment/invoice-link", post(create_invoice_link))
        .route("/api/payment/stars", post(confirm_stars_payment))
        .route("/api/payment/status/{payload}", get(payment_status))
        .route("/api/payment/history/{telegram_id}", get(payment_history))
}
