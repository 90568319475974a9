//! View model for month-grid calendar widgets.
//!
//! Computes the week-aligned range a month grid shows, asks an
//! [`ItemSource`](provider::ItemSource) for the items in it, projects them
//! into wire records and maps clicked records back to the original items.

pub mod config;
pub mod ctrl;
pub mod events;
pub mod logging;
pub mod projector;
pub mod provider;
pub mod registry;
pub mod theme;

pub use config::Config;
pub use ctrl::{CalendarController, RecordBatch, RenderTarget};
pub use events::{Event, ItemClicked};
pub use projector::{CalendarRecord, DataGenerator, ItemProjector};
pub use provider::{DateRange, Error, ErrorKind, ItemSource, ListSource, Result, Tz};
pub use registry::IdentityRegistry;
pub use theme::ThemeTag;
