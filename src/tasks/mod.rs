pub mod query;
pub mod recurrence;
pub mod summary;

pub use query::{ListParams, ListQuery};

use chrono::{Local, NaiveDate};

/// The server's local calendar date, used for due-date comparisons.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
