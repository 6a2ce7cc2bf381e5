pub mod cbr;
pub mod converter;
pub mod provider;
pub mod source;
pub mod table;

pub use cbr::CbrDailySource;
pub use converter::CurrencyConverter;
pub use provider::RateProvider;
pub use source::{RateSource, StaticRates};
pub use table::RateTable;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RateError {
    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),
    #[error("Rate lookup failed: {0}")]
    Fetch(String),
    #[error("Converted amount is out of range: {0}")]
    Overflow(String),
}

impl From<reqwest::Error> for RateError {
    fn from(error: reqwest::Error) -> Self {
        RateError::Fetch(error.to_string())
    }
}
