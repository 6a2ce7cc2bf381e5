use alfafin_core::{NewPurchase, Purchase};
use alfafin_rates::{CurrencyConverter, RateError};
use chrono::{DateTime, FixedOffset};
use chrono_tz::Tz;

use crate::error::PurchaseError;
use crate::normalize;
use crate::template::{Field, TemplateSet};

/// Builds purchases from notification text: template match, normalization,
/// then conversion to roubles.
pub struct PurchaseBuilder {
    templates: TemplateSet,
    converter: CurrencyConverter,
    tz: Tz,
}

impl PurchaseBuilder {
    pub fn new(templates: TemplateSet, converter: CurrencyConverter) -> Self {
        let tz = converter.rates().timezone();
        Self { templates, converter, tz }
    }

    pub fn templates(&self) -> &TemplateSet {
        &self.templates
    }

    pub fn converter(&self) -> &CurrencyConverter {
        &self.converter
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Parses `text`. `fallback` is the purchase time unless the message
    /// carries its own date.
    pub async fn build(
        &self,
        fallback: DateTime<FixedOffset>,
        text: &str,
    ) -> Result<Purchase, PurchaseError> {
        let normalized = text.replace("\r\n", " ").replace('\n', " ");
        let normalized = normalized.trim();

        let m = self
            .templates
            .find(normalized)
            .ok_or_else(|| PurchaseError::NoTemplateMatch(text.to_string()))?;
        tracing::debug!(template = m.index, operation = %m.operation, "Message matched");

        let raw_price = m
            .get(Field::Price)
            .ok_or_else(|| PurchaseError::NoTemplateMatch(text.to_string()))?;
        let price = m.operation.apply(normalize::parse_amount(raw_price)?);

        // The balance is informational; an unreadable one never costs the purchase.
        let balance = m.get(Field::Balance).and_then(|raw| match normalize::parse_balance(raw) {
            Ok(balance) => Some(balance),
            Err(e) => {
                tracing::warn!(raw, error = %e, "Ignoring unreadable balance");
                None
            }
        });

        let mut time = fallback;
        if let Some(raw) = m.get(Field::Date) {
            time = normalize::parse_date(raw, self.tz)?;
        }

        let mut merchant = m.get(Field::Merchant).unwrap_or_default().to_string();
        if let Some(raw) = m.get(Field::MerchantDatetime) {
            let (name, at) = normalize::split_merchant_datetime(raw, self.tz)?;
            merchant = name;
            time = at;
        }
        let merchant = normalize::clean_merchant(&merchant);
        if merchant.is_empty() {
            tracing::warn!(text, "Merchant is empty after cleanup");
        }

        let currency = match m.get(Field::Currency) {
            Some(raw) => normalize::parse_currency(raw)?,
            None => return Err(PurchaseError::NoTemplateMatch(text.to_string())),
        };
        let price_rub = match self.converter.convert(price, currency, time).await {
            Ok(price_rub) => price_rub,
            Err(RateError::Overflow(_)) => {
                return Err(PurchaseError::InvalidNumber(raw_price.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Purchase::new(NewPurchase {
            time,
            price,
            merchant,
            card: m.get(Field::Card).map(str::to_string),
            currency,
            price_rub,
            balance,
            operation: m.operation,
        }))
    }
}
