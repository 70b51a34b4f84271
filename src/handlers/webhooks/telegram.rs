//! Bot webhook: `pre_checkout_query` approval and `successful_payment` crediting.
//!
//! Telegram retries any update that does not get a 2xx, so processing failures
//! are logged and still acknowledged. Redelivered payments are absorbed by the
//! reconciler's payload deduplication.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use subtle::ConstantTimeEq;

use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::models::{CompleteInvoice, PaymentSource, UpsertAccount};
use crate::payload::validate_payload;
use crate::payments::{PreCheckoutQuery, SuccessfulPayment, TelegramUser, Update};
use crate::reconcile::{self, warn_on_declared_mismatch};

pub const SECRET_TOKEN_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Parsed update, reduced to what the payment flow cares about.
#[derive(Debug)]
pub enum TelegramEvent {
    PreCheckout(PreCheckoutQuery),
    PaymentSucceeded {
        from: TelegramUser,
        payment: SuccessfulPayment,
    },
    /// Plain messages, commands and every other update type.
    Ignored,
}

#[derive(Debug, Serialize)]
struct WebhookAck {
    ok: bool,
}

pub fn parse_event(body: &Bytes) -> serde_json::Result<TelegramEvent> {
    let update: Update = serde_json::from_slice(body)?;

    if let Some(query) = update.pre_checkout_query {
        return Ok(TelegramEvent::PreCheckout(query));
    }

    let Some(message) = update.message else {
        return Ok(TelegramEvent::Ignored);
    };
    let Some(payment) = message.successful_payment else {
        return Ok(TelegramEvent::Ignored);
    };

    // Payments only happen in private chats, where the chat id is the user id.
    let from = message.from.unwrap_or(TelegramUser {
        id: message.chat.id,
        first_name: None,
        username: None,
    });

    Ok(TelegramEvent::PaymentSucceeded { from, payment })
}

/// Constant-time comparison against the secret registered with `setWebhook`.
pub fn verify_secret_token(headers: &HeaderMap, expected: &str) -> bool {
    headers
        .get(SECRET_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|provided| provided.as_bytes().ct_eq(expected.as_bytes()).into())
}

pub async fn handle_telegram_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Some(expected) = state.webhook_secret.as_deref()
        && !verify_secret_token(&headers, expected)
    {
        tracing::warn!("Rejected webhook update with missing or wrong secret token");
        return AppError::Unauthorized.into_response();
    }

    match parse_event(&body) {
        Ok(TelegramEvent::PreCheckout(query)) => answer_pre_checkout(&state, &query).await,
        Ok(TelegramEvent::PaymentSucceeded { from, payment }) => {
            if let Err(e) = process_successful_payment(&state, &from, payment) {
                tracing::error!("Failed to process successful_payment from {}: {}", from.id, e);
            }
        }
        Ok(TelegramEvent::Ignored) => {}
        Err(e) => tracing::warn!("Ignoring malformed webhook update: {}", e),
    }

    Json(WebhookAck { ok: true }).into_response()
}

/// Every pre-checkout query is approved; stock and pricing never change.
async fn answer_pre_checkout(state: &AppState, query: &PreCheckoutQuery) {
    tracing::debug!(
        "Pre-checkout query {} from {}: payload={}, amount={} {}",
        query.id,
        query.from.id,
        query.invoice_payload,
        query.total_amount,
        query.currency
    );

    let Some(client) = &state.telegram else {
        tracing::warn!("No bot token configured; pre-checkout query {} left unanswered", query.id);
        return;
    };

    if let Err(e) = client.answer_pre_checkout_query(&query.id, true, None).await {
        tracing::error!("Failed to answer pre-checkout query {}: {}", query.id, e);
    }
}

/// Credit a payment reported by Telegram, creating the account if this is the
/// first time the payer reaches the backend.
pub fn process_successful_payment(
    state: &AppState,
    from: &TelegramUser,
    payment: SuccessfulPayment,
) -> Result<()> {
    validate_payload(&payment.invoice_payload)?;

    let mut conn = state.db.get()?;
    // Committed on its own: a payer whose payload is later rejected (owned by
    // someone else) keeps an empty account, like any first contact.
    queries::get_or_create_account(
        &conn,
        &UpsertAccount {
            telegram_id: from.id,
            username: from.username.clone(),
            first_name: from.first_name.clone(),
        },
    )?;

    let signal = CompleteInvoice {
        payload: payment.invoice_payload,
        telegram_id: from.id,
        currency: Some(payment.currency),
        declared_amount: Some(payment.total_amount),
        source: PaymentSource::Webhook,
        telegram_charge_id: Some(payment.telegram_payment_charge_id),
    };
    warn_on_declared_mismatch(&signal, &state.invoice);

    let outcome = reconcile::reconcile_payment(&mut conn, &signal)?;
    if outcome.already_processed {
        tracing::info!("Webhook payment {} was already credited", signal.payload);
    }
    Ok(())
}
