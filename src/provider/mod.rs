use std::sync::Arc;

pub mod datetime;
pub mod error;
pub mod list;
pub mod tz;

pub use datetime::{compute_range, format_wire_date, parse_viewport_date, DateRange};
pub use error::{Error, ErrorKind, Result};
pub use list::ListSource;
pub use tz::Tz;

/// Supplies the items a calendar shows for a date range.
///
/// Every returned item must have a date inside `range` (inclusive). How an
/// item's date is determined is up to the implementation. Failures should be
/// reported as `ErrorKind::Source` and are handed to the caller unchanged.
pub trait ItemSource<T>: Send + Sync {
    fn items(&self, range: &DateRange<Tz>) -> Result<Vec<Arc<T>>>;
}
