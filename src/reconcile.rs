//! Payment reconciliation: invoice issuance and at-most-once crediting.
//!
//! Every completion channel (the Mini App's `openInvoice` callback, the bot
//! webhook, a client retry after polling) funnels into [`reconcile_payment`],
//! keyed by the invoice payload. The ledger transition and the credit share one
//! SQLite transaction, so a payload is either completed *and* credited, or
//! neither.

use rusqlite::{Connection, TransactionBehavior};
use serde::Serialize;

use crate::config::InvoiceSettings;
use crate::db::queries;
use crate::error::{AppError, OptionExt, Result, msg};
use crate::models::{Account, CompleteInvoice, CreateInvoice, Invoice, STARS_CURRENCY};
use crate::payload::gen_payload;
use crate::payments::{InvoiceRequest, TelegramClient};

/// Coins granted for one completed Stars purchase.
pub const AWARD_AMOUNT: i64 = 10_000;

/// Result of feeding one completion signal through the reconciler.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileOutcome {
    pub account: Account,
    pub invoice: Invoice,
    /// `AWARD_AMOUNT` for the call that completed the invoice, 0 for every repeat.
    pub coins_awarded: i64,
    pub already_processed: bool,
}

/// Complete the invoice for `signal.payload` and credit its owner exactly once.
///
/// Safe to call any number of times, concurrently, from any channel. The
/// `BEGIN IMMEDIATE` transaction takes SQLite's write lock up front, so the
/// account check, the conditional ledger upsert, and the credit are serialized
/// against every other writer.
pub fn reconcile_payment(conn: &mut Connection, signal: &CompleteInvoice) -> Result<ReconcileOutcome> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let account = queries::get_account(&tx, signal.telegram_id)?
        .or_not_found(msg::ACCOUNT_NOT_FOUND)?;

    let (invoice, newly_completed) = queries::mark_invoice_completed(&tx, signal, AWARD_AMOUNT)?;

    if invoice.telegram_id != signal.telegram_id {
        tracing::warn!(
            "Rejected completion of invoice {} for account {}: owned by {}",
            invoice.payload,
            signal.telegram_id,
            invoice.telegram_id
        );
        return Err(AppError::Conflict(msg::INVOICE_OWNER_MISMATCH.into()));
    }

    if !newly_completed {
        tracing::debug!(
            "Invoice {} already processed ({:?} signal ignored)",
            invoice.payload,
            signal.source
        );
        return Ok(ReconcileOutcome {
            account,
            invoice,
            coins_awarded: 0,
            already_processed: true,
        });
    }

    // The ledger says completed from here on; a failed credit must roll it back
    // and be reported, never leave a completed invoice without coins.
    let account = match queries::credit_account(&tx, signal.telegram_id, AWARD_AMOUNT) {
        Ok(Some(account)) => account,
        Ok(None) => {
            tracing::error!(
                "Payment inconsistency: invoice {} completed but account {} disappeared before credit, rolling back",
                invoice.payload,
                signal.telegram_id
            );
            return Err(AppError::Internal(format!(
                "credit failed for invoice {}",
                invoice.payload
            )));
        }
        Err(e) => {
            tracing::error!(
                "Payment inconsistency: invoice {} completed but crediting account {} failed: {}, rolling back",
                invoice.payload,
                signal.telegram_id,
                e
            );
            return Err(e);
        }
    };

    tx.commit()?;

    tracing::info!(
        "Stars payment reconciled: payload={}, telegram_id={}, source={:?}, awarded={}, balance={}",
        invoice.payload,
        account.telegram_id,
        signal.source,
        AWARD_AMOUNT,
        account.coins
    );

    Ok(ReconcileOutcome {
        account,
        invoice,
        coins_awarded: AWARD_AMOUNT,
        already_processed: false,
    })
}

/// Record a new pending invoice for `telegram_id` under a fresh payload.
///
/// Delivering it to the user is a separate step ([`spawn_invoice_delivery`] or
/// an awaited `createInvoiceLink`); if that step fails, the pending row simply
/// stays unused and a later completion for the payload still reconciles.
pub fn create_invoice(
    conn: &Connection,
    telegram_id: i64,
    settings: &InvoiceSettings,
) -> Result<Invoice> {
    queries::get_account(conn, telegram_id)?.or_not_found(msg::ACCOUNT_NOT_FOUND)?;

    // A v4 collision is not expected; the retry only guards the first-writer-wins insert.
    for _ in 0..3 {
        let payload = gen_payload(telegram_id);
        let created = queries::create_pending_invoice(
            conn,
            &CreateInvoice {
                payload: payload.clone(),
                telegram_id,
                currency: STARS_CURRENCY.to_string(),
                declared_amount: settings.price_stars,
            },
        )?;

        if created {
            tracing::info!("Invoice issued: payload={}, telegram_id={}", payload, telegram_id);
            return queries::get_invoice(conn, &payload)?
                .ok_or_else(|| AppError::Internal(format!("invoice {} not found after insert", payload)));
        }
    }

    Err(AppError::Internal("could not allocate a unique invoice payload".into()))
}

/// Send the invoice into the user's bot chat without blocking the request.
pub fn spawn_invoice_delivery(
    client: TelegramClient,
    settings: InvoiceSettings,
    chat_id: i64,
    payload: String,
) {
    tokio::spawn(async move {
        let request = InvoiceRequest::stars(&settings, &payload);
        match client.send_invoice(chat_id, request).await {
            Ok(()) => tracing::debug!("Invoice {} sent to chat {}", payload, chat_id),
            Err(e) => tracing::warn!(
                "Failed to send invoice {} to chat {}: {} (pending record kept)",
                payload,
                chat_id,
                e
            ),
        }
    });
}

/// Log completion signals whose declared price does not match what was issued.
///
/// The award never depends on these values. Only the webhook channel carries
/// amounts reported by Telegram itself; the Mini App channel is caller-declared.
pub fn warn_on_declared_mismatch(signal: &CompleteInvoice, settings: &InvoiceSettings) {
    let currency_mismatch = signal
        .currency
        .as_deref()
        .is_some_and(|c| c != STARS_CURRENCY);
    let amount_mismatch = signal
        .declared_amount
        .is_some_and(|a| a != settings.price_stars);

    if currency_mismatch || amount_mismatch {
        tracing::warn!(
            "Declared payment does not match invoice price: payload={}, source={:?}, currency={:?}, amount={:?}, expected={} {}",
            signal.payload,
            signal.source,
            signal.currency,
            signal.declared_amount,
            settings.price_stars,
            STARS_CURRENCY
        );
    }
}
