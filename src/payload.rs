//! Invoice payload generation and validation.
//!
//! Server-issued payloads look like `stars_{telegram_id}_{uuid_simple}`.
//! Payloads generated by the Mini App itself are accepted as long as they fit
//! Telegram's invoice payload limit; uniqueness is the only hard requirement.

use uuid::Uuid;

use crate::error::{AppError, Result, msg};

pub const PAYLOAD_PREFIX: &str = "stars";

/// Telegram rejects invoice payloads longer than this.
pub const MAX_PAYLOAD_BYTES: usize = 128;

/// Generate a fresh payload for an invoice owned by `telegram_id`.
pub fn gen_payload(telegram_id: i64) -> String {
    format!(
        "{}_{}_{}",
        PAYLOAD_PREFIX,
        telegram_id,
        Uuid::new_v4().as_simple()
    )
}

/// Reject payloads that could never have come from a Telegram invoice.
pub fn validate_payload(payload: &str) -> Result<()> {
    if payload.trim().is_empty() {
        return Err(AppError::BadRequest(msg::INVOICE_PAYLOAD_REQUIRED.into()));
    }
    if payload.len() > MAX_PAYLOAD_BYTES {
        return Err(AppError::BadRequest(msg::INVOICE_PAYLOAD_TOO_LONG.into()));
    }
    Ok(())
}
