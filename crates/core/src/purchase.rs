use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::currency::Currency;
use super::money::Money;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    #[default]
    Buy,
    Cancel,
}

impl Operation {
    /// Sign applied to the notified amount: cancellations are recorded negative.
    pub fn apply(self, amount: Money) -> Money {
        match self {
            Operation::Buy => amount,
            Operation::Cancel => -amount,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Buy => write!(f, "buy"),
            Operation::Cancel => write!(f, "cancel"),
        }
    }
}

/// Field values of a purchase before it is frozen into a [`Purchase`].
#[derive(Debug, Clone)]
pub struct NewPurchase {
    pub time: DateTime<FixedOffset>,
    pub price: Money,
    pub merchant: String,
    pub card: Option<String>,
    pub currency: Currency,
    pub price_rub: Money,
    pub balance: Option<Money>,
    pub operation: Operation,
}

/// A parsed, currency-converted purchase. Read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Purchase {
    time: DateTime<FixedOffset>,
    price: Money,
    merchant: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    card: Option<String>,
    currency: Currency,
    #[serde(rename = "priceRUB")]
    price_rub: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    balance: Option<Money>,
    operation: Operation,
}

impl Purchase {
    pub fn new(p: NewPurchase) -> Self {
        Purchase {
            time: p.time,
            price: p.price,
            merchant: p.merchant,
            card: p.card,
            currency: p.currency,
            price_rub: p.price_rub,
            balance: p.balance,
            operation: p.operation,
        }
    }

    pub fn time(&self) -> DateTime<FixedOffset> {
        self.time
    }

    /// Amount in the original currency, negative for a cancellation.
    pub fn price(&self) -> Money {
        self.price
    }

    pub fn merchant(&self) -> &str {
        &self.merchant
    }

    pub fn card(&self) -> Option<&str> {
        self.card.as_deref()
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Amount in roubles.
    pub fn price_rub(&self) -> Money {
        self.price_rub
    }

    pub fn balance(&self) -> Option<Money> {
        self.balance
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }
}
