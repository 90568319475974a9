use derive_more::Constructor;
use serde::Serialize;

use crate::projector::CalendarRecord;

/// Complete item set for the widget, replacing whatever it showed before.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Constructor)]
#[serde(rename_all = "camelCase")]
pub struct RecordBatch {
    pub items: Vec<CalendarRecord>,
    pub hide_weekends: bool,
}

impl RecordBatch {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn find(&self, key: &str) -> Option<&CalendarRecord> {
        self.items.iter().find(|record| record.id() == key)
    }
}

/// Receiving end of rendered batches, usually the bridge to the client.
pub trait RenderTarget: Send {
    fn replace_items(&mut self, batch: &RecordBatch);
}

impl<F> RenderTarget for F
where
    F: FnMut(&RecordBatch) + Send,
{
    fn replace_items(&mut self, batch: &RecordBatch) {
        self(batch)
    }
}

/// Drops every batch. For hosts that only poll `CalendarController::batch`.
#[derive(Debug, Default)]
pub struct Discard;

impl RenderTarget for Discard {
    fn replace_items(&mut self, _batch: &RecordBatch) {}
}
