//! Daily official rates of the Central Bank of Russia, read from the public
//! JSON mirror (`daily_json.js` and `archive/YYYY/MM/DD/daily_json.js`).

use async_trait::async_trait;
use chrono::{DateTime, Days, FixedOffset, NaiveDate};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use crate::source::RateSource;
use crate::table::RateTable;
use crate::RateError;

pub const DEFAULT_BASE_URL: &str = "https://www.cbr-xml-daily.ru";

/// How far back to look for a published table when the requested day has
/// none (weekends and public holidays).
const MAX_LOOKBACK_DAYS: u64 = 10;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct DailyRates {
    #[serde(rename = "Date")]
    date: DateTime<FixedOffset>,
    #[serde(rename = "Valute")]
    valute: HashMap<String, Valute>,
}

#[derive(Debug, Deserialize)]
struct Valute {
    #[serde(rename = "Nominal")]
    nominal: u32,
    #[serde(rename = "Value")]
    value: f64,
}

impl DailyRates {
    fn into_table(self, date: NaiveDate) -> RateTable {
        let mut table = RateTable::new(date);
        for (code, v) in self.valute {
            // Shortest round-trip form, so 97.3261 stays exactly 97.3261.
            let value = match Decimal::from_str(&v.value.to_string()) {
                Ok(value) if v.nominal > 0 => value,
                _ => {
                    tracing::warn!(code = %code, value = v.value, nominal = v.nominal, "Skipping malformed rate");
                    continue;
                }
            };
            // Quoted per `nominal` units, e.g. 100 AMD.
            table.insert(&code, value / Decimal::from(v.nominal));
        }
        table
    }
}

pub struct CbrDailySource {
    base_url: String,
    client: reqwest::Client,
}

impl CbrDailySource {
    pub fn new(base_url: &str) -> Result<Self, RateError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { base_url: base_url.trim_end_matches('/').to_string(), client })
    }

    pub fn latest_url(&self) -> String {
        format!("{}/daily_json.js", self.base_url)
    }

    pub fn archive_url(&self, date: NaiveDate) -> String {
        format!("{}/archive/{}/daily_json.js", self.base_url, date.format("%Y/%m/%d"))
    }

    /// `Ok(None)` when nothing was published at `url`.
    async fn get(&self, url: &str) -> Result<Option<DailyRates>, RateError> {
        tracing::debug!(url, "Fetching currency rates");
        let response = self.client.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(RateError::Fetch(format!("{url}: HTTP {}", response.status())));
        }
        let body = response.text().await?;
        let rates = serde_json::from_str(&body)
            .map_err(|e| RateError::Fetch(format!("{url}: {e}")))?;
        Ok(Some(rates))
    }
}

#[async_trait]
impl RateSource for CbrDailySource {
    async fn fetch(&self, date: Option<NaiveDate>) -> Result<RateTable, RateError> {
        let Some(date) = date else {
            let url = self.latest_url();
            let rates = self
                .get(&url)
                .await?
                .ok_or_else(|| RateError::Fetch(format!("{url}: not found")))?;
            let published = rates.date.date_naive();
            return Ok(rates.into_table(published));
        };

        let mut day = date;
        for _ in 0..=MAX_LOOKBACK_DAYS {
            if let Some(rates) = self.get(&self.archive_url(day)).await? {
                if day != date {
                    tracing::debug!(%date, published = %day, "Using last published rates");
                }
                return Ok(rates.into_table(date));
            }
            day = day
                .checked_sub_days(Days::new(1))
                .ok_or_else(|| RateError::Fetch(format!("no rates published for {date}")))?;
        }
        Err(RateError::Fetch(format!("no rates published for {date}")))
    }
}
