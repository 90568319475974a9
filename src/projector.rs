//! Projection of domain items into the records a calendar widget renders.
//!
//! A projector is configured once with extractor closures and never looks at
//! an item's fields itself. Every record needs a date, a label and a theme;
//! an extractor that yields nothing fails the projection instead of falling
//! back to a placeholder.

use chrono::{DateTime, FixedOffset, Timelike};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::provider::datetime::{format_wire_date, to_fixed};
use crate::provider::list::DateFn;
use crate::provider::{Error, ErrorKind, Result, Tz};
use crate::registry::IdentityRegistry;
use crate::theme::ThemeTag;

pub const ITEM_ID_PROPERTY: &str = "id";
pub const ITEM_DATE_PROPERTY: &str = "date";
pub const ITEM_LABEL_PROPERTY: &str = "subject";
pub const ITEM_THEME_PROPERTY: &str = "theme";

pub type LabelFn<T> = dyn Fn(&T) -> Option<String> + Send + Sync;
pub type ThemeFn<T> = dyn Fn(&T) -> Option<ThemeTag> + Send + Sync;

/// Adds extra properties to an item's record.
pub trait DataGenerator<T>: Send + Sync {
    fn generate_data(&self, item: &T, data: &mut Map<String, Value>);
}

impl<T, F> DataGenerator<T> for F
where
    F: Fn(&T, &mut Map<String, Value>) + Send + Sync,
{
    fn generate_data(&self, item: &T, data: &mut Map<String, Value>) {
        self(item, data)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CalendarRecord {
    id: String,
    date: DateTime<FixedOffset>,
    label: String,
    theme: ThemeTag,
    extra: Map<String, Value>,
}

impl CalendarRecord {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn date(&self) -> &DateTime<FixedOffset> {
        &self.date
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn theme(&self) -> ThemeTag {
        self.theme
    }

    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// Wire form of the record. Extra properties are written last and win
    /// over the built-in ones.
    pub fn to_json(&self) -> Value {
        let mut json = Map::new();
        json.insert(ITEM_ID_PROPERTY.to_owned(), Value::from(self.id.as_str()));
        json.insert(
            ITEM_DATE_PROPERTY.to_owned(),
            Value::from(format_wire_date(&self.date)),
        );
        json.insert(ITEM_LABEL_PROPERTY.to_owned(), Value::from(self.label.as_str()));
        json.insert(
            ITEM_THEME_PROPERTY.to_owned(),
            Value::from(self.theme.theme_name()),
        );
        json.extend(self.extra.iter().map(|(k, v)| (k.clone(), v.clone())));

        Value::Object(json)
    }
}

impl Serialize for CalendarRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

pub struct ItemProjector<T> {
    label_of: Box<LabelFn<T>>,
    date_of: Arc<DateFn<T>>,
    theme_of: Option<Box<ThemeFn<T>>>,
    generators: Vec<Box<dyn DataGenerator<T>>>,
    tz: Tz,
}

impl<T> ItemProjector<T> {
    pub fn new<L, D>(label_of: L, date_of: D) -> Self
    where
        L: Fn(&T) -> Option<String> + Send + Sync + 'static,
        D: Fn(&T) -> Option<DateTime<FixedOffset>> + Send + Sync + 'static,
    {
        ItemProjector {
            label_of: Box::new(label_of),
            date_of: Arc::new(date_of),
            theme_of: None,
            generators: Vec::new(),
            tz: Tz::default(),
        }
    }

    pub fn with_theme<F>(mut self, theme_of: F) -> Self
    where
        F: Fn(&T) -> Option<ThemeTag> + Send + Sync + 'static,
    {
        self.theme_of = Some(Box::new(theme_of));
        self
    }

    pub fn with_data_generator<G>(mut self, generator: G) -> Self
    where
        G: DataGenerator<T> + 'static,
    {
        self.generators.push(Box::new(generator));
        self
    }

    /// Zone record dates are expressed in before they are sent.
    pub fn with_timezone(mut self, tz: Tz) -> Self {
        self.set_timezone(tz);
        self
    }

    pub fn set_timezone(&mut self, tz: Tz) {
        self.tz = tz;
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Shared date extractor, e.g. for building a `ListSource` over the same items.
    pub fn date_fn(&self) -> Arc<DateFn<T>> {
        Arc::clone(&self.date_of)
    }

    pub fn project(
        &self,
        item: &Arc<T>,
        registry: &mut IdentityRegistry<T>,
    ) -> Result<CalendarRecord> {
        let date = (self.date_of)(item).ok_or_else(|| {
            Error::new(ErrorKind::DateMissing, "date extractor returned no value")
        })?;

        let label = (self.label_of)(item).ok_or_else(|| {
            Error::new(ErrorKind::LabelMissing, "label extractor returned no value")
        })?;

        let theme = match &self.theme_of {
            Some(theme_of) => theme_of(item).ok_or_else(|| {
                Error::new(ErrorKind::ThemeMissing, "theme extractor returned no value")
            })?,
            None => ThemeTag::default(),
        };

        let date = to_fixed(&date.with_timezone(&self.tz));
        let date = date
            .with_nanosecond(0)
            .and_then(|d| d.with_second(0))
            .unwrap_or(date);

        let mut extra = Map::new();
        for generator in self.generators.iter() {
            generator.generate_data(item, &mut extra);
        }

        Ok(CalendarRecord {
            id: registry.key_for(item),
            date,
            label,
            theme,
            extra,
        })
    }
}
