use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::table::RateTable;
use crate::RateError;

/// Where daily exchange rates come from.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Fetches the table published for `date`, or the latest one for `None`.
    async fn fetch(&self, date: Option<NaiveDate>) -> Result<RateTable, RateError>;
}

#[async_trait]
impl<T: RateSource + ?Sized> RateSource for Arc<T> {
    async fn fetch(&self, date: Option<NaiveDate>) -> Result<RateTable, RateError> {
        (**self).fetch(date).await
    }
}

/// Fixed in-memory tables, for tests and offline runs.
pub struct StaticRates {
    current: RateTable,
    historical: HashMap<NaiveDate, RateTable>,
    fetches: AtomicUsize,
}

impl StaticRates {
    pub fn new(current: RateTable) -> Self {
        Self { current, historical: HashMap::new(), fetches: AtomicUsize::new(0) }
    }

    pub fn with_historical(mut self, table: RateTable) -> Self {
        self.historical.insert(table.date(), table);
        self
    }

    /// Number of `fetch` calls served so far.
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RateSource for StaticRates {
    async fn fetch(&self, date: Option<NaiveDate>) -> Result<RateTable, RateError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        match date {
            None => Ok(self.current.clone()),
            Some(date) => self
                .historical
                .get(&date)
                .cloned()
                .ok_or_else(|| RateError::Fetch(format!("no rates published for {date}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn static_rates_serve_current_and_historical() {
        let source = StaticRates::new(
            RateTable::new(date(2024, 7, 1)).with_rate("USD", Decimal::new(8800, 2)),
        )
        .with_historical(RateTable::new(date(2023, 8, 16)).with_rate("USD", Decimal::new(9712, 2)));

        let current = source.fetch(None).await.unwrap();
        assert_eq!(current.get("USD"), Some(Decimal::new(8800, 2)));

        let past = source.fetch(Some(date(2023, 8, 16))).await.unwrap();
        assert_eq!(past.get("USD"), Some(Decimal::new(9712, 2)));

        assert!(matches!(
            source.fetch(Some(date(2020, 1, 1))).await,
            Err(RateError::Fetch(_))
        ));
        assert_eq!(source.fetches(), 3);
    }
}
