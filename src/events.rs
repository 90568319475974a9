use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::provider::{Error, ErrorKind, Result};

pub const ACTIVE_DATE_CHANGED: &str = "active-date-changed";
pub const EVENT_CLICKED: &str = "event-clicked";

/// Signals sent by the calendar widget.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// The user navigated; carries the new reference date as sent by the client.
    ViewportChanged(String),
    /// An item was clicked; carries the key it was rendered with.
    ItemActivated(String),
}

#[derive(Deserialize)]
struct ActiveDateDetail {
    value: String,
}

#[derive(Deserialize)]
struct ClickDetail {
    id: String,
}

impl Event {
    /// Decodes a DOM event name and its `event.detail` payload.
    pub fn from_dom(name: &str, detail: &Value) -> Result<Self> {
        match name {
            ACTIVE_DATE_CHANGED => {
                let detail = ActiveDateDetail::deserialize(detail)?;
                Ok(Event::ViewportChanged(detail.value))
            }
            EVENT_CLICKED => {
                let detail = ClickDetail::deserialize(detail)?;
                Ok(Event::ItemActivated(detail.id))
            }
            other => Err(Error::new(
                ErrorKind::Protocol,
                &format!("unsupported event '{}'", other),
            )),
        }
    }
}

/// Emitted to click listeners when a rendered item is activated.
#[derive(Debug)]
pub struct ItemClicked<T> {
    pub key: String,
    pub item: Arc<T>,
}

impl<T> Clone for ItemClicked<T> {
    fn clone(&self) -> Self {
        ItemClicked {
            key: self.key.clone(),
            item: Arc::clone(&self.item),
        }
    }
}
