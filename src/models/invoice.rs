use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

/// Telegram Stars currency code.
pub const STARS_CURRENCY: &str = "XTR";

/// Invoice lifecycle. `Completed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum InvoiceStatus {
    Pending,
    Completed,
}

/// Channel that delivered the completion signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PaymentSource {
    /// `POST /api/payment/stars` from the Mini App (invoice callback or poll retry).
    App,
    /// `successful_payment` update delivered to the bot webhook.
    Webhook,
}

/// One purchase attempt, deduplicated by `payload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub payload: String,
    pub telegram_id: i64,
    /// Currency as declared by the issuer or the completion signal. Informational.
    pub currency: Option<String>,
    /// Amount as declared by the issuer or the completion signal. Informational.
    pub declared_amount: Option<i64>,
    /// Coins granted on completion (0 while pending).
    pub award_amount: i64,
    pub status: InvoiceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PaymentSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telegram_charge_id: Option<String>,
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct CreateInvoice {
    pub payload: String,
    pub telegram_id: i64,
    pub currency: String,
    pub declared_amount: i64,
}

/// A normalized completion signal, whichever channel it came from.
#[derive(Debug, Clone)]
pub struct CompleteInvoice {
    pub payload: String,
    pub telegram_id: i64,
    pub currency: Option<String>,
    pub declared_amount: Option<i64>,
    pub source: PaymentSource,
    pub telegram_charge_id: Option<String>,
}
