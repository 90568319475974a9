use chrono::{DateTime, FixedOffset};
use std::sync::{Arc, RwLock};

use super::{DateRange, ItemSource, Result, Tz};

pub type DateFn<T> = dyn Fn(&T) -> Option<DateTime<FixedOffset>> + Send + Sync;

/// In-memory item source over a fixed batch of items.
pub struct ListSource<T> {
    items: RwLock<Vec<Arc<T>>>,
    date_of: Arc<DateFn<T>>,
}

impl<T> ListSource<T> {
    pub fn new(items: Vec<Arc<T>>, date_of: Arc<DateFn<T>>) -> Self {
        ListSource {
            items: RwLock::new(items),
            date_of,
        }
    }

    pub fn from_items<I>(items: I, date_of: Arc<DateFn<T>>) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        Self::new(items.into_iter().map(Arc::new).collect(), date_of)
    }

    /// Replaces the backing items. Takes effect on the next query.
    pub fn set_items(&self, items: Vec<Arc<T>>) {
        *self.items.write().expect("item list lock poisoned") = items;
    }

    pub fn len(&self) -> usize {
        self.items.read().expect("item list lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Send + Sync> ItemSource<T> for ListSource<T> {
    fn items(&self, range: &DateRange<Tz>) -> Result<Vec<Arc<T>>> {
        let items = self.items.read().expect("item list lock poisoned");

        // Undated items are kept so that projection reports them.
        let matching: Vec<_> = items
            .iter()
            .filter(|item| match (self.date_of)(item) {
                Some(date) => range.contains(&date),
                None => true,
            })
            .cloned()
            .collect();

        log::debug!(
            "{} of {} items between {} and {}",
            matching.len(),
            items.len(),
            range.first_day(),
            range.last_day()
        );

        Ok(matching)
    }
}
