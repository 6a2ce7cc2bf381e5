use alfafin_core::{Currency, Money};
use chrono::{DateTime, FixedOffset};
use std::sync::Arc;

use crate::provider::RateProvider;
use crate::RateError;

/// Converts amounts into roubles at the rate of the transaction's day.
#[derive(Clone)]
pub struct CurrencyConverter {
    rates: Arc<RateProvider>,
}

impl CurrencyConverter {
    pub fn new(rates: Arc<RateProvider>) -> Self {
        Self { rates }
    }

    pub fn rates(&self) -> &Arc<RateProvider> {
        &self.rates
    }

    pub async fn convert(
        &self,
        price: Money,
        currency: Currency,
        time: DateTime<FixedOffset>,
    ) -> Result<Money, RateError> {
        if currency.is_home() {
            return Ok(price);
        }
        let date = time.with_timezone(&self.rates.timezone()).date_naive();
        let table = self.rates.get(date).await?;
        let rate = table
            .get(currency.code())
            .ok_or_else(|| RateError::UnknownCurrency(currency.code().to_string()))?;
        price
            .checked_convert(rate)
            .ok_or_else(|| RateError::Overflow(format!("{price} {} at {rate}", currency.code())))
    }
}
