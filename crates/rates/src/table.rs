use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Rouble value of one unit of each foreign currency, as published for `date`.
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    date: NaiveDate,
    rates: HashMap<String, Decimal>,
}

impl RateTable {
    pub fn new(date: NaiveDate) -> Self {
        Self { date, rates: HashMap::new() }
    }

    pub fn with_rate(mut self, code: &str, rate: Decimal) -> Self {
        self.insert(code, rate);
        self
    }

    pub fn insert(&mut self, code: &str, rate: Decimal) {
        self.rates.insert(code.to_string(), rate);
    }

    pub fn get(&self, code: &str) -> Option<Decimal> {
        self.rates.get(code).copied()
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}
