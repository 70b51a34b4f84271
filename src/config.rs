use std::env;

pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    /// Bot token; without it invoices are recorded but never sent.
    pub bot_token: Option<String>,
    pub telegram_api_url: String,
    /// Expected `X-Telegram-Bot-Api-Secret-Token` on webhook deliveries.
    pub webhook_secret: Option<String>,
    pub invoice: InvoiceSettings,
    pub dev_mode: bool,
}

/// What the bot shows the user when it issues a Stars invoice.
#[derive(Debug, Clone)]
pub struct InvoiceSettings {
    pub title: String,
    pub description: String,
    /// Price in Telegram Stars (XTR).
    pub price_stars: i64,
}

impl Default for InvoiceSettings {
    fn default() -> Self {
        Self {
            title: "10,000 coins".to_string(),
            description: "Buy 10,000 coins with Telegram Stars".to_string(),
            price_stars: 1,
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("STARCLICKER_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let defaults = InvoiceSettings::default();
        let invoice = InvoiceSettings {
            title: non_empty_var("INVOICE_TITLE").unwrap_or(defaults.title),
            description: non_empty_var("INVOICE_DESCRIPTION").unwrap_or(defaults.description),
            price_stars: env::var("INVOICE_PRICE_STARS")
                .ok()
                .and_then(|p| p.parse().ok())
                .filter(|p: &i64| *p > 0)
                .unwrap_or(defaults.price_stars),
        };

        Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "starclicker.db".to_string()),
            bot_token: non_empty_var("TELEGRAM_BOT_TOKEN"),
            telegram_api_url: non_empty_var("TELEGRAM_API_URL")
                .unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.to_string()),
            webhook_secret: non_empty_var("TELEGRAM_WEBHOOK_SECRET"),
            invoice,
            dev_mode,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
