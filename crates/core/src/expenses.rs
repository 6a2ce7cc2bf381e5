use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::money::Money;
use super::period::DateRange;
use super::purchase::Purchase;

const DAY_FORMAT: &str = "%Y-%m-%d";

/// Aggregate of one calendar day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub count: u64,
    pub sum: Money,
}

impl Expense {
    fn record(&mut self, amount: Money) {
        self.count += 1;
        self.sum = self.sum + amount;
    }

    fn merge(self, other: Expense) -> Expense {
        Expense {
            count: self.count + other.count,
            sum: self.sum + other.sum,
        }
    }
}

/// Serialized view of the ledger, day keys formatted `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub expenses: BTreeMap<String, Expense>,
    pub count: u64,
    pub sum: Money,
}

/// In-memory per-day spending statistics for the life of the process.
///
/// Buckets are keyed by the calendar date of the purchase in the home
/// timezone, never by the timestamp itself: two instants on the same local
/// day always land in one bucket regardless of their offsets.
pub struct Expenses {
    tz: Tz,
    days: Mutex<BTreeMap<NaiveDate, Expense>>,
}

impl Expenses {
    pub fn new(tz: Tz) -> Self {
        Self { tz, days: Mutex::new(BTreeMap::new()) }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Counts `p` into its day bucket. Every call counts, so callers must add
    /// a purchase exactly once.
    pub fn add(&self, p: &Purchase) {
        let day = self.day_of(p);
        self.lock().entry(day).or_default().record(p.price_rub());
    }

    pub fn day(&self, date: NaiveDate) -> Option<Expense> {
        self.lock().get(&date).copied()
    }

    pub fn sum(&self) -> Money {
        self.lock().values().map(|e| e.sum).sum()
    }

    pub fn count(&self) -> u64 {
        self.lock().values().map(|e| e.count).sum()
    }

    /// Totals over the days inside `range`.
    pub fn total(&self, range: DateRange) -> Expense {
        self.lock()
            .iter()
            .filter(|(day, _)| range.contains(**day))
            .map(|(_, e)| *e)
            .fold(Expense::default(), Expense::merge)
    }

    pub fn snapshot(&self) -> Stats {
        let days = self.lock().clone();
        let (count, sum) = days
            .values()
            .fold((0, Money::zero()), |(c, s), e| (c + e.count, s + e.sum));
        Stats {
            expenses: days
                .into_iter()
                .map(|(day, e)| (day.format(DAY_FORMAT).to_string(), e))
                .collect(),
            count,
            sum,
        }
    }

    fn day_of(&self, p: &Purchase) -> NaiveDate {
        p.time().with_timezone(&self.tz).date_naive()
    }

    // A panic in another holder cannot leave a bucket half-updated, so the
    // data behind a poisoned lock is still consistent.
    fn lock(&self) -> MutexGuard<'_, BTreeMap<NaiveDate, Expense>> {
        self.days.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::Currency;
    use crate::purchase::{NewPurchase, Operation};
    use chrono::{FixedOffset, TimeZone};
    use std::sync::Arc;

    fn purchase(y: i32, m: u32, d: u32, h: u32, offset_hours: i32, cents: i64) -> Purchase {
        let offset = FixedOffset::east_opt(offset_hours * 3600).unwrap();
        Purchase::new(NewPurchase {
            time: offset.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap(),
            price: Money::from_cents(cents),
            merchant: "Озон".to_string(),
            card: None,
            currency: Currency::Rub,
            price_rub: Money::from_cents(cents),
            balance: None,
            operation: Operation::Buy,
        })
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn three_purchases_on_two_days() {
        let e = Expenses::new(chrono_tz::Europe::Moscow);
        e.add(&purchase(2023, 8, 16, 7, 3, 10000));
        e.add(&purchase(2023, 8, 16, 14, 3, 2550));
        e.add(&purchase(2023, 8, 17, 9, 3, 52711));

        assert_eq!(e.count(), 3);
        assert_eq!(e.sum(), Money::from_cents(65261));

        let stats = e.snapshot();
        assert_eq!(stats.expenses.len(), 2);
        assert_eq!(
            stats.expenses["2023-08-16"],
            Expense { count: 2, sum: Money::from_cents(12550) }
        );
        assert_eq!(
            stats.expenses["2023-08-17"],
            Expense { count: 1, sum: Money::from_cents(52711) }
        );
        assert_eq!(stats.count, 3);
        assert_eq!(stats.sum, Money::from_cents(65261));
    }

    #[test]
    fn buckets_by_home_timezone_day() {
        let e = Expenses::new(chrono_tz::Europe::Moscow);
        // 23:00 UTC on the 15th is 02:00 on the 16th in Moscow
        e.add(&purchase(2023, 8, 15, 23, 0, 100));
        e.add(&purchase(2023, 8, 16, 2, 3, 200));

        assert_eq!(e.day(date(2023, 8, 15)), None);
        assert_eq!(
            e.day(date(2023, 8, 16)),
            Some(Expense { count: 2, sum: Money::from_cents(300) })
        );
    }

    #[test]
    fn cancellation_reduces_sum() {
        let e = Expenses::new(chrono_tz::Europe::Moscow);
        e.add(&purchase(2023, 8, 16, 7, 3, 52711));
        e.add(&purchase(2023, 8, 16, 8, 3, -52711));
        assert_eq!(e.count(), 2);
        assert!(e.sum().is_zero());
    }

    #[test]
    fn total_over_range() {
        let e = Expenses::new(chrono_tz::Europe::Moscow);
        e.add(&purchase(2023, 8, 14, 12, 3, 100));
        e.add(&purchase(2023, 8, 20, 12, 3, 200));
        e.add(&purchase(2023, 8, 21, 12, 3, 400));

        let week = e.total(DateRange::new(date(2023, 8, 14), date(2023, 8, 20)));
        assert_eq!(week, Expense { count: 2, sum: Money::from_cents(300) });

        let inverted = e.total(DateRange::new(date(2023, 8, 20), date(2023, 8, 14)));
        assert_eq!(inverted, Expense::default());
    }

    #[test]
    fn json_snapshot_format() {
        let e = Expenses::new(chrono_tz::Europe::Moscow);
        e.add(&purchase(2023, 8, 16, 7, 3, 52711));
        assert_eq!(
            serde_json::to_string(&e.snapshot()).unwrap(),
            r#"{"expenses":{"2023-08-16":{"count":1,"sum":527.11}},"count":1,"sum":527.11}"#
        );
    }

    #[test]
    fn empty_ledger() {
        let e = Expenses::new(chrono_tz::Europe::Moscow);
        assert_eq!(e.count(), 0);
        assert!(e.sum().is_zero());
        assert_eq!(
            serde_json::to_string(&e.snapshot()).unwrap(),
            r#"{"expenses":{},"count":0,"sum":0.0}"#
        );
    }

    #[test]
    fn concurrent_adds_are_all_counted() {
        let e = Arc::new(Expenses::new(chrono_tz::Europe::Moscow));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let e = Arc::clone(&e);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        e.add(&purchase(2023, 8, 16, 7, 3, 1));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(e.count(), 800);
        assert_eq!(e.sum(), Money::from_cents(800));
    }
}
