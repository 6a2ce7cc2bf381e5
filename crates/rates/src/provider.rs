use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::source::RateSource;
use crate::table::RateTable;
use crate::RateError;

/// Owns the rate cache: the current table plus every historical table
/// fetched so far. Published rates for a past day never change, so those
/// stay cached for the life of the provider.
pub struct RateProvider {
    source: Box<dyn RateSource>,
    tz: Tz,
    current: RwLock<Option<Arc<RateTable>>>,
    historical: RwLock<HashMap<NaiveDate, Arc<RateTable>>>,
}

impl RateProvider {
    pub fn new(source: impl RateSource + 'static, tz: Tz) -> Self {
        Self {
            source: Box::new(source),
            tz,
            current: RwLock::new(None),
            historical: RwLock::new(HashMap::new()),
        }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Today's date in the home timezone.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.tz).date_naive()
    }

    /// Replaces the current table with a freshly fetched one.
    pub async fn refresh(&self) -> Result<(), RateError> {
        let table = self.source.fetch(None).await?;
        tracing::info!(date = %table.date(), currencies = table.len(), "Currency rates refreshed");
        *self.current.write().await = Some(Arc::new(table));
        Ok(())
    }

    /// The current table, fetched on first use.
    pub async fn current(&self) -> Result<Arc<RateTable>, RateError> {
        if let Some(table) = self.current.read().await.as_ref() {
            return Ok(Arc::clone(table));
        }
        // No lock is held while fetching; a table stored meanwhile wins.
        let fetched = Arc::new(self.source.fetch(None).await?);
        let mut current = self.current.write().await;
        Ok(Arc::clone(current.get_or_insert(fetched)))
    }

    /// Rates applicable on `date`: the current table for today, the table
    /// published for that day otherwise.
    pub async fn get(&self, date: NaiveDate) -> Result<Arc<RateTable>, RateError> {
        if date == self.today() {
            return self.current().await;
        }
        if let Some(table) = self.historical.read().await.get(&date) {
            return Ok(Arc::clone(table));
        }
        let fetched = Arc::new(self.source.fetch(Some(date)).await?);
        let mut historical = self.historical.write().await;
        Ok(Arc::clone(historical.entry(date).or_insert(fetched)))
    }
}
