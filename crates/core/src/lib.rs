pub mod currency;
pub mod expenses;
pub mod money;
pub mod period;
pub mod purchase;

pub use currency::{Currency, UnknownCurrency};
pub use expenses::{Expense, Expenses, Stats};
pub use money::Money;
pub use period::{DateRange, SummaryPeriod};
pub use purchase::{NewPurchase, Operation, Purchase};
