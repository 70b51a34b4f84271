use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::db::{AppState, queries};
use crate::error::{AppError, OptionExt, Result, msg};
use crate::extractors::{Json, Path};
use crate::models::{Account, CompleteInvoice, Invoice, InvoiceStatus, PaymentSource};
use crate::payload::validate_payload;
use crate::payments::InvoiceRequest;
use crate::reconcile::{self, spawn_invoice_delivery, warn_on_declared_mismatch};

use super::require_telegram_id;

#[derive(Debug, Deserialize)]
pub struct InvoiceBody {
    #[serde(default)]
    pub telegram_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CreateInvoiceResponse {
    pub success: bool,
    pub invoice_payload: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_link: Option<String>,
}

/// Record a pending invoice and send it into the bot chat in the background.
///
/// Responds as soon as the ledger row exists; a failed `sendInvoice` is only logged.
pub async fn create_invoice(
    State(state): State<AppState>,
    Json(body): Json<InvoiceBody>,
) -> Result<Json<CreateInvoiceResponse>> {
    let telegram_id = require_telegram_id(body.telegram_id)?;

    let invoice = {
        let conn = state.db.get()?;
        reconcile::create_invoice(&conn, telegram_id, &state.invoice)?
    };

    match &state.telegram {
        Some(client) => spawn_invoice_delivery(
            client.clone(),
            state.invoice.clone(),
            telegram_id,
            invoice.payload.clone(),
        ),
        None => tracing::warn!(
            "No bot token configured; invoice {} recorded but not sent",
            invoice.payload
        ),
    }

    Ok(Json(CreateInvoiceResponse {
        success: true,
        invoice_payload: invoice.payload,
        invoice_link: None,
    }))
}

/// Record a pending invoice and return a link for `Telegram.WebApp.openInvoice`.
pub async fn create_invoice_link(
    State(state): State<AppState>,
    Json(body): Json<InvoiceBody>,
) -> Result<Json<CreateInvoiceResponse>> {
    let telegram_id = require_telegram_id(body.telegram_id)?;
    let client = state
        .telegram
        .clone()
        .ok_or_else(|| AppError::Upstream(msg::BOT_NOT_CONFIGURED.into()))?;

    let invoice = {
        let conn = state.db.get()?;
        reconcile::create_invoice(&conn, telegram_id, &state.invoice)?
    };

    let link = client
        .create_invoice_link(InvoiceRequest::stars(&state.invoice, &invoice.payload))
        .await?;

    Ok(Json(CreateInvoiceResponse {
        success: true,
        invoice_payload: invoice.payload,
        invoice_link: Some(link),
    }))
}

/// Completion signal from the Mini App, sent from the `openInvoice` callback
/// with status `paid` and again by any client-side retry.
#[derive(Debug, Deserialize)]
pub struct StarsPaymentRequest {
    #[serde(default)]
    pub telegram_id: Option<i64>,
    #[serde(default)]
    pub invoice_payload: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub total_amount: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct StarsPaymentResponse {
    pub success: bool,
    pub user: Account,
    pub payment: Invoice,
    pub coins_awarded: i64,
    pub already_processed: bool,
}

pub async fn confirm_stars_payment(
    State(state): State<AppState>,
    Json(request): Json<StarsPaymentRequest>,
) -> Result<Json<StarsPaymentResponse>> {
    let telegram_id = require_telegram_id(request.telegram_id)?;
    let payload = request.invoice_payload.unwrap_or_default();
    validate_payload(&payload)?;

    let signal = CompleteInvoice {
        payload,
        telegram_id,
        currency: request.currency,
        declared_amount: request.total_amount,
        source: PaymentSource::App,
        telegram_charge_id: None,
    };
    warn_on_declared_mismatch(&signal, &state.invoice);

    let mut conn = state.db.get()?;
    let outcome = reconcile::reconcile_payment(&mut conn, &signal)?;

    Ok(Json(StarsPaymentResponse {
        success: true,
        user: outcome.account,
        payment: outcome.invoice,
        coins_awarded: outcome.coins_awarded,
        already_processed: outcome.already_processed,
    }))
}

#[derive(Debug, Serialize)]
pub struct PaymentStatusResponse {
    pub invoice_payload: String,
    pub status: InvoiceStatus,
    pub coins_awarded: i64,
}

/// Polled by the Mini App after the invoice closes, to learn whether the
/// webhook already credited the purchase.
pub async fn payment_status(
    State(state): State<AppState>,
    Path(payload): Path<String>,
) -> Result<Json<PaymentStatusResponse>> {
    let conn = state.db.get()?;
    let invoice = queries::get_invoice(&conn, &payload)?.or_not_found(msg::INVOICE_NOT_FOUND)?;

    Ok(Json(PaymentStatusResponse {
        invoice_payload: invoice.payload,
        status: invoice.status,
        coins_awarded: invoice.award_amount,
    }))
}

pub async fn payment_history(
    State(state): State<AppState>,
    Path(telegram_id): Path<i64>,
) -> Result<Json<Vec<Invoice>>> {
    let conn = state.db.get()?;
    queries::get_account(&conn, telegram_id)?.or_not_found(msg::ACCOUNT_NOT_FOUND)?;
    Ok(Json(queries::list_invoices_for_account(&conn, telegram_id)?))
}
