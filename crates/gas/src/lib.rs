//! Client for the Google Apps Script web app that keeps the spending
//! spreadsheet.

use alfafin_core::{Purchase, SummaryPeriod};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";
const ERROR_MARKER: &str = ".errorMessage";
const ERROR_PREFIX: &str = "Error: ";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum GasError {
    #[error("GAS request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("GAS: {0}")]
    Remote(String),
    #[error("GAS: unexpected response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone)]
pub struct GasConfig {
    pub url: String,
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Deserialize)]
struct GasResponse {
    status: i64,
    #[serde(default)]
    message: String,
}

pub struct GasClient {
    config: GasConfig,
    client: reqwest::Client,
}

impl GasClient {
    pub fn new(config: GasConfig) -> Result<Self, GasError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { config, client })
    }

    fn credentials(&self) -> [(&'static str, &str); 2] {
        [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ]
    }

    /// Appends a purchase to the spreadsheet. Returns the script's message.
    pub async fn add(&self, purchase: &Purchase) -> Result<String, GasError> {
        let form = form_fields(purchase);
        tracing::debug!(url = %self.config.url, ?form, "GAS add");
        let body = self
            .client
            .post(&self.config.url)
            .query(&self.credentials())
            .form(&form)
            .send()
            .await?
            .text()
            .await?;
        let message = parse_response(&body)?;
        tracing::debug!(%message, "GAS add response");
        Ok(message)
    }

    /// Spending summary text for a period, as rendered by the script.
    pub async fn summary(&self, period: SummaryPeriod) -> Result<String, GasError> {
        let command = period.to_string();
        tracing::debug!(url = %self.config.url, %command, "GAS summary");
        let body = self
            .client
            .get(&self.config.url)
            .query(&self.credentials())
            .query(&[("command", command.as_str())])
            .send()
            .await?
            .text()
            .await?;
        parse_response(&body)
    }
}

/// Form fields posted for one purchase.
pub fn form_fields(p: &Purchase) -> Vec<(&'static str, String)> {
    vec![
        ("time", p.time().format(TIME_FORMAT).to_string()),
        ("merchant", p.merchant().to_string()),
        ("price", p.price().to_string()),
        ("currency", p.currency().to_string()),
        ("priceRUB", p.price_rub().to_string()),
    ]
}

/// Reads the script's reply: either an HTML error page carrying
/// `.errorMessage`, or `{"status": 0, "message": "..."}`.
pub fn parse_response(body: &str) -> Result<String, GasError> {
    if body.contains(ERROR_MARKER) {
        return Err(GasError::Remote(error_text(body)));
    }
    let r: GasResponse =
        serde_json::from_str(body).map_err(|e| GasError::Decode(e.to_string()))?;
    if r.status != 0 {
        return Err(GasError::Remote(r.message));
    }
    Ok(r.message)
}

// Text after the last "Error: ", without the closing character of the
// enclosing markup.
fn error_text(body: &str) -> String {
    let Some(pos) = body.rfind(ERROR_PREFIX) else {
        return String::new();
    };
    let rest = &body[pos + ERROR_PREFIX.len()..];
    let mut chars = rest.chars();
    chars.next_back();
    chars.as_str().to_string()
}
