use alfafin_core::UnknownCurrency;
use alfafin_rates::RateError;
use thiserror::Error;

/// Why a message could not be turned into a purchase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PurchaseError {
    #[error("Message matches no known format: {0:?}")]
    NoTemplateMatch(String),
    #[error("Invalid number: {0:?}")]
    InvalidNumber(String),
    #[error("Incorrect merchant and datetime format: {0:?}")]
    MalformedMerchantDatetime(String),
    #[error("Invalid date {value:?}: {reason}")]
    InvalidDate { value: String, reason: String },
    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),
    #[error("Currency rate lookup failed: {0}")]
    RateLookupFailure(String),
}

impl PurchaseError {
    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            PurchaseError::NoTemplateMatch(_) => "no_template_match",
            PurchaseError::InvalidNumber(_) => "invalid_number",
            PurchaseError::MalformedMerchantDatetime(_) => "malformed_merchant_datetime",
            PurchaseError::InvalidDate { .. } => "invalid_date",
            PurchaseError::UnknownCurrency(_) => "unknown_currency",
            PurchaseError::RateLookupFailure(_) => "rate_lookup_failure",
        }
    }
}

impl From<UnknownCurrency> for PurchaseError {
    fn from(e: UnknownCurrency) -> Self {
        PurchaseError::UnknownCurrency(e.0)
    }
}

impl From<RateError> for PurchaseError {
    fn from(e: RateError) -> Self {
        match e {
            RateError::UnknownCurrency(code) => PurchaseError::UnknownCurrency(code),
            RateError::Fetch(reason) => PurchaseError::RateLookupFailure(reason),
            RateError::Overflow(amount) => PurchaseError::InvalidNumber(amount),
        }
    }
}
