use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reporting window understood by the remote ledger's summary command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryPeriod {
    Today,
    Week,
    Month,
    Year,
}

impl fmt::Display for SummaryPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummaryPeriod::Today => write!(f, "today"),
            SummaryPeriod::Week => write!(f, "week"),
            SummaryPeriod::Month => write!(f, "month"),
            SummaryPeriod::Year => write!(f, "year"),
        }
    }
}

impl std::str::FromStr for SummaryPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "today" => Ok(SummaryPeriod::Today),
            "week" => Ok(SummaryPeriod::Week),
            "month" => Ok(SummaryPeriod::Month),
            "year" => Ok(SummaryPeriod::Year),
            other => Err(format!("Unknown period: '{other}'")),
        }
    }
}

impl SummaryPeriod {
    /// Calendar range of the period containing `today`. Weeks start on Monday.
    pub fn range(self, today: NaiveDate) -> DateRange {
        match self {
            SummaryPeriod::Today => DateRange::new(today, today),
            SummaryPeriod::Week => {
                let start = today - Days::new(u64::from(today.weekday().num_days_from_monday()));
                DateRange::new(start, start + Days::new(6))
            }
            SummaryPeriod::Month => {
                let start = today.with_day(1).unwrap_or(today);
                let end = start
                    .checked_add_months(chrono::Months::new(1))
                    .and_then(|next| next.pred_opt())
                    .unwrap_or(today);
                DateRange::new(start, end)
            }
            SummaryPeriod::Year => {
                let start = today.with_ordinal(1).unwrap_or(today);
                let end = NaiveDate::from_ymd_opt(today.year(), 12, 31).unwrap_or(today);
                DateRange::new(start, end)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    /// Both ends are inclusive; a range whose start is after its end is empty.
    pub fn contains(self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}
