//! Turns raw captured substrings into typed values.

use std::str::FromStr;
use std::sync::OnceLock;

use alfafin_core::{Currency, Money};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use regex::Regex;
use rust_decimal::Decimal;

use crate::error::PurchaseError;

const DATE_FORMAT: &str = "%d.%m.%Y";
const DATETIME_FORMAT: &str = "%d.%m.%Y %H:%M";
const SPACES: [char; 3] = [' ', '\u{a0}', '\u{202f}'];

fn re_merchant_datetime() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| {
        Regex::new(r"^(.+) ([0-9]{2}\.[0-9]{2}\.[0-9]{4} [0-9]{2}:[0-9]{2})")
            .expect("invalid regex")
    })
}

/// Parses `"1 234,56"`-style amounts: the first comma is the decimal
/// separator, spaces (plain and non-breaking) group thousands.
pub fn parse_amount(raw: &str) -> Result<Money, PurchaseError> {
    let s = raw.replacen(',', ".", 1).replace(SPACES, "");
    let dec = Decimal::from_str(&s).map_err(|_| PurchaseError::InvalidNumber(raw.to_string()))?;
    Ok(Money::from_decimal(dec))
}

/// Like [`parse_amount`], tolerating a trailing currency sign or code
/// (`"12 345,67 ₽"`).
pub fn parse_balance(raw: &str) -> Result<Money, PurchaseError> {
    let trimmed = raw.trim();
    let amount = match trimmed.rsplit_once(SPACES) {
        Some((amount, last)) if Currency::from_str(last).is_ok() => amount,
        _ => trimmed,
    };
    parse_amount(amount).map_err(|_| PurchaseError::InvalidNumber(raw.to_string()))
}

pub fn parse_currency(raw: &str) -> Result<Currency, PurchaseError> {
    Ok(Currency::from_str(raw.trim())?)
}

/// Drops every ASCII digit from a merchant name, then trims it.
pub fn clean_merchant(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_ascii_digit())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Splits `"YANDEX GO 16.08.2023 07:36"` into the merchant and the local
/// time of the purchase.
pub fn split_merchant_datetime(
    raw: &str,
    tz: Tz,
) -> Result<(String, DateTime<FixedOffset>), PurchaseError> {
    let caps = re_merchant_datetime()
        .captures(raw)
        .ok_or_else(|| PurchaseError::MalformedMerchantDatetime(raw.to_string()))?;
    let merchant = caps[1].to_string();
    let value = &caps[2];
    let naive = NaiveDateTime::parse_from_str(value, DATETIME_FORMAT).map_err(|e| {
        PurchaseError::InvalidDate { value: value.to_string(), reason: e.to_string() }
    })?;
    Ok((merchant, localize(naive, value, tz)?))
}

/// Parses a `DD.MM.YYYY` date as local midnight.
pub fn parse_date(raw: &str, tz: Tz) -> Result<DateTime<FixedOffset>, PurchaseError> {
    let value = raw.trim();
    let date = NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| {
        PurchaseError::InvalidDate { value: value.to_string(), reason: e.to_string() }
    })?;
    localize(date.and_time(chrono::NaiveTime::MIN), value, tz)
}

fn localize(naive: NaiveDateTime, value: &str, tz: Tz) -> Result<DateTime<FixedOffset>, PurchaseError> {
    tz.from_local_datetime(&naive)
        .single()
        .map(|t| t.fixed_offset())
        .ok_or_else(|| PurchaseError::InvalidDate {
            value: value.to_string(),
            reason: format!("no single local time in {tz}"),
        })
}
