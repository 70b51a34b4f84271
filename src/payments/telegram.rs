use reqwest::Client;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::config::InvoiceSettings;
use crate::error::{AppError, Result};
use crate::models::STARS_CURRENCY;

/// Bot API response envelope.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<i64>,
}

impl<T> ApiResponse<T> {
    fn into_result(self, method: &str) -> Result<T> {
        if !self.ok {
            return Err(AppError::Upstream(format!(
                "{} failed ({}): {}",
                method,
                self.error_code.unwrap_or_default(),
                self.description.unwrap_or_else(|| "no description".to_string())
            )));
        }
        self.result
            .ok_or_else(|| AppError::Upstream(format!("{} returned no result", method)))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LabeledPrice {
    pub label: String,
    pub amount: i64,
}

/// Body shared by `sendInvoice` and `createInvoiceLink`.
///
/// Stars invoices use an empty provider token and a single price line.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<i64>,
    pub title: String,
    pub description: String,
    pub payload: String,
    pub provider_token: String,
    pub currency: String,
    pub prices: Vec<LabeledPrice>,
}

impl InvoiceRequest {
    pub fn stars(settings: &InvoiceSettings, payload: &str) -> Self {
        Self {
            chat_id: None,
            title: settings.title.clone(),
            description: settings.description.clone(),
            payload: payload.to_string(),
            provider_token: String::new(),
            currency: STARS_CURRENCY.to_string(),
            prices: vec![LabeledPrice {
                label: settings.title.clone(),
                amount: settings.price_stars,
            }],
        }
    }

    pub fn to_chat(mut self, chat_id: i64) -> Self {
        self.chat_id = Some(chat_id);
        self
    }
}

#[derive(Debug, Serialize)]
struct AnswerPreCheckoutQuery<'a> {
    pre_checkout_query_id: &'a str,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<&'a str>,
}

/// Minimal Telegram Bot API client for Stars invoicing.
#[derive(Debug, Clone)]
pub struct TelegramClient {
    client: Client,
    api_url: String,
    token: String,
}

impl TelegramClient {
    pub fn new(api_url: &str, token: &str) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }

    async fn call<B: Serialize, T: DeserializeOwned>(&self, method: &str, body: &B) -> Result<T> {
        // The request URL embeds the bot token, so it is stripped from errors.
        let response = self
            .client
            .post(self.method_url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("{} request failed: {}", method, e.without_url())))?;

        let envelope: ApiResponse<T> = response.json().await.map_err(|e| {
            AppError::Upstream(format!("failed to parse {} response: {}", method, e.without_url()))
        })?;

        envelope.into_result(method)
    }

    /// Post a Stars invoice into the user's private chat with the bot.
    pub async fn send_invoice(&self, chat_id: i64, invoice: InvoiceRequest) -> Result<()> {
        let _message: serde_json::Value = self.call("sendInvoice", &invoice.to_chat(chat_id)).await?;
        Ok(())
    }

    /// Create a link the Mini App can open with `Telegram.WebApp.openInvoice`.
    pub async fn create_invoice_link(&self, invoice: InvoiceRequest) -> Result<String> {
        self.call("createInvoiceLink", &invoice).await
    }

    /// Telegram waits up to 10 seconds for this answer before failing the payment.
    pub async fn answer_pre_checkout_query(
        &self,
        query_id: &str,
        ok: bool,
        error_message: Option<&str>,
    ) -> Result<()> {
        let _accepted: bool = self
            .call(
                "answerPreCheckoutQuery",
                &AnswerPreCheckoutQuery {
                    pre_checkout_query_id: query_id,
                    ok,
                    error_message,
                },
            )
            .await?;
        Ok(())
    }
}

// ============ Webhook update types ============

/// The subset of a Telegram `Update` this bot reacts to.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub pre_checkout_query: Option<PreCheckoutQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<TelegramUser>,
    pub chat: Chat,
    pub successful_payment: Option<SuccessfulPayment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    pub first_name: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PreCheckoutQuery {
    pub id: String,
    pub from: TelegramUser,
    pub currency: String,
    pub total_amount: i64,
    pub invoice_payload: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SuccessfulPayment {
    pub currency: String,
    pub total_amount: i64,
    pub invoice_payload: String,
    pub telegram_payment_charge_id: String,
    pub provider_payment_charge_id: Option<String>,
}
