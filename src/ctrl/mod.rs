pub mod calctrl;
pub mod render;

pub use calctrl::{CalendarController, ClickListener, Registration, State};
pub use render::{Discard, RecordBatch, RenderTarget};
