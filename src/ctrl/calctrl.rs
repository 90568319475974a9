use chrono::{DateTime, FixedOffset, Utc, Weekday};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::config::Config;
use crate::events::{Event, ItemClicked};
use crate::provider::{
    compute_range, parse_viewport_date, DateRange, Error, ErrorKind, ItemSource, ListSource,
    Result, Tz,
};
use crate::projector::ItemProjector;
use crate::registry::IdentityRegistry;

use super::render::{RecordBatch, RenderTarget};

pub type ClickListener<T> = dyn FnMut(&ItemClicked<T>) + Send;

/// Handle for removing a click listener again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Registration(usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    /// No item source attached yet.
    Idle,
    Bound,
}

/// View model behind one calendar widget.
///
/// Owns the visible range and the key registry of everything it ever
/// rendered. Every successful attach, refresh or viewport change hands
/// exactly one complete batch to the render target; a failing one leaves
/// the previous state in place and renders nothing.
pub struct CalendarController<T> {
    id: Uuid,
    week_start: Weekday,
    hide_weekends: bool,
    tz: Tz,
    projector: ItemProjector<T>,
    source: Option<Arc<dyn ItemSource<T>>>,
    range: Option<DateRange<Tz>>,
    registry: IdentityRegistry<T>,
    batch: RecordBatch,
    target: Box<dyn RenderTarget>,
    listeners: Vec<(Registration, Box<ClickListener<T>>)>,
    next_registration: usize,
}

impl<T> CalendarController<T> {
    pub fn new<R>(mut projector: ItemProjector<T>, config: &Config, target: R) -> Self
    where
        R: RenderTarget + 'static,
    {
        projector.set_timezone(config.timezone);

        CalendarController {
            id: Uuid::new_v4(),
            week_start: config.week_start,
            hide_weekends: config.hide_weekends,
            tz: config.timezone,
            projector,
            source: None,
            range: None,
            registry: IdentityRegistry::new(),
            batch: RecordBatch::default(),
            target: Box::new(target),
            listeners: Vec::new(),
            next_registration: 0,
        }
    }

    pub fn id(&self) -> &Uuid {
        &self.id
    }

    pub fn state(&self) -> State {
        if self.source.is_some() {
            State::Bound
        } else {
            State::Idle
        }
    }

    pub fn range(&self) -> Option<&DateRange<Tz>> {
        self.range.as_ref()
    }

    /// Last batch handed to the render target.
    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn registry(&self) -> &IdentityRegistry<T> {
        &self.registry
    }

    pub fn hide_weekends(&self) -> bool {
        self.hide_weekends
    }

    /// Changes the weekend flag; a bound calendar is re-rendered with it.
    pub fn set_hide_weekends(&mut self, hide_weekends: bool) -> Result<()> {
        let previous = std::mem::replace(&mut self.hide_weekends, hide_weekends);

        if self.state() == State::Idle {
            return Ok(());
        }

        self.refresh().map_err(|err| {
            self.hide_weekends = previous;
            err
        })
    }

    pub fn into_shared(self) -> Arc<Mutex<Self>> {
        Arc::new(Mutex::new(self))
    }

    fn current_range(&self) -> DateRange<Tz> {
        self.range.clone().unwrap_or_else(|| {
            let now = Utc::now().with_timezone(&self.tz);
            compute_range(&now, self.week_start)
        })
    }

    fn materialize(
        &mut self,
        source: &dyn ItemSource<T>,
        range: &DateRange<Tz>,
    ) -> Result<RecordBatch> {
        let items = source.items(range)?;
        let projector = &self.projector;
        let registry = &mut self.registry;

        let records = items
            .iter()
            .map(|item| projector.project(item, registry))
            .collect::<Result<Vec<_>>>()?;

        log::debug!(
            "calendar {}: {} records for {} - {}",
            self.id,
            records.len(),
            range.first_day(),
            range.last_day()
        );

        Ok(RecordBatch::new(records, self.hide_weekends))
    }

    fn render(&mut self, batch: RecordBatch) {
        self.target.replace_items(&batch);
        self.batch = batch;
    }

    /// Attaches `source` and renders the current range, starting at the
    /// month of today if no range was set before.
    pub fn attach_source(&mut self, source: Arc<dyn ItemSource<T>>) -> Result<()> {
        let range = self.current_range();
        let batch = self.materialize(source.as_ref(), &range)?;

        log::info!(
            "calendar {}: item source attached ({} items)",
            self.id,
            batch.len()
        );

        self.source = Some(source);
        self.range = Some(range);
        self.render(batch);
        Ok(())
    }

    /// Shows `items`, dated by the projector's date extractor.
    pub fn set_items(&mut self, items: Vec<T>) -> Result<()>
    where
        T: Send + Sync + 'static,
    {
        let source = ListSource::from_items(items, self.projector.date_fn());
        self.attach_source(Arc::new(source))
    }

    /// Queries the source again for the current range.
    pub fn refresh(&mut self) -> Result<()> {
        let source = self.source.clone().ok_or_else(|| {
            Error::new(ErrorKind::NotBound, "attach an item source before refreshing")
        })?;
        let range = self.current_range();

        let batch = self.materialize(source.as_ref(), &range)?;
        self.range = Some(range);
        self.render(batch);
        Ok(())
    }

    /// Moves the viewport to the month containing `reference`.
    ///
    /// Without a source the range is only remembered and an empty batch is
    /// rendered.
    pub fn on_viewport_changed(&mut self, reference: DateTime<FixedOffset>) -> Result<()> {
        let range = compute_range(&reference.with_timezone(&self.tz), self.week_start);

        let batch = match self.source.clone() {
            Some(source) => self.materialize(source.as_ref(), &range)?,
            None => RecordBatch::new(Vec::new(), self.hide_weekends),
        };

        self.range = Some(range);
        self.render(batch);
        Ok(())
    }

    /// Like `on_viewport_changed`, with the date as sent by the widget.
    pub fn on_viewport_payload(&mut self, payload: &str) -> Result<()> {
        let reference = parse_viewport_date(payload).map_err(|err| {
            log::warn!("calendar {}: rejected viewport change: {}", self.id, err);
            err
        })?;

        self.on_viewport_changed(reference)
    }

    /// Resolves a clicked key and notifies all click listeners.
    pub fn on_item_activated(&mut self, key: &str) -> Result<ItemClicked<T>> {
        let item = match self.registry.resolve(key) {
            Some(item) => item,
            None => {
                log::warn!("calendar {}: click on unknown key '{}'", self.id, key);
                return Err(Error::new(
                    ErrorKind::UnknownKey,
                    &format!("'{}' was never rendered by this calendar", key),
                ));
            }
        };

        let event = ItemClicked {
            key: key.to_owned(),
            item,
        };

        for (_, listener) in self.listeners.iter_mut() {
            listener(&event);
        }

        Ok(event)
    }

    pub fn handle(&mut self, event: Event) -> Result<()> {
        match event {
            Event::ViewportChanged(payload) => self.on_viewport_payload(&payload),
            Event::ItemActivated(key) => self.on_item_activated(&key).map(|_| ()),
        }
    }

    pub fn add_click_listener<F>(&mut self, listener: F) -> Registration
    where
        F: FnMut(&ItemClicked<T>) + Send + 'static,
    {
        let registration = Registration(self.next_registration);
        self.next_registration += 1;
        self.listeners.push((registration, Box::new(listener)));
        registration
    }

    pub fn remove_click_listener(&mut self, registration: Registration) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(r, _)| *r != registration);
        self.listeners.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ctrl::render::Discard;
    use crate::provider::datetime::to_fixed;
    use crate::provider::list::DateFn;
    use crate::theme::ThemeTag;
    use chrono::{Duration, NaiveDate, TimeZone};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Appointment {
        label: String,
        at: DateTime<FixedOffset>,
        theme: Option<ThemeTag>,
    }

    fn at(y: i32, m: u32, d: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(y, m, d, 9, 30, 0)
            .unwrap()
    }

    fn appointment(label: &str, at: DateTime<FixedOffset>) -> Appointment {
        Appointment {
            label: label.to_owned(),
            at,
            theme: None,
        }
    }

    fn config() -> Config {
        Config {
            timezone: Tz::utc(),
            ..Config::default()
        }
    }

    fn projector() -> ItemProjector<Appointment> {
        ItemProjector::new(|a: &Appointment| Some(a.label.clone()), |a: &Appointment| Some(a.at))
    }

    type Batches = Arc<Mutex<Vec<RecordBatch>>>;

    fn recording() -> (Batches, impl FnMut(&RecordBatch) + Send) {
        let batches = Batches::default();
        let sink = Arc::clone(&batches);
        (batches, move |batch: &RecordBatch| {
            sink.lock().unwrap().push(batch.clone())
        })
    }

    fn controller(target: impl RenderTarget + 'static) -> CalendarController<Appointment> {
        let mut controller = CalendarController::new(projector(), &config(), target);
        controller.on_viewport_changed(at(2024, 3, 15)).unwrap();
        controller
    }

    fn labels(batch: &RecordBatch) -> Vec<&str> {
        batch.items.iter().map(|r| r.label()).collect()
    }

    /// Generates one item per day of whatever range it is asked for.
    struct EveryDay {
        date_of: Arc<DateFn<Appointment>>,
    }

    impl ItemSource<Appointment> for EveryDay {
        fn items(&self, range: &DateRange<Tz>) -> Result<Vec<Arc<Appointment>>> {
            let mut day = range.first_day();
            let mut items = Vec::new();
            while day <= range.last_day() {
                let item = appointment(
                    &day.format("%d.%m.%Y").to_string(),
                    to_fixed(&Tz::utc().from_utc_datetime(&day.and_hms_opt(12, 0, 0).unwrap())),
                );
                assert!((self.date_of)(&item).map_or(false, |d| range.contains(&d)));
                items.push(Arc::new(Appointment {
                    theme: Some(ThemeTag::LightBlue),
                    ..item
                }));
                day = day + Duration::days(1);
            }
            Ok(items)
        }
    }

    struct Unreachable;

    /// Delegates to `inner` until switched offline.
    struct Flaky {
        inner: ListSource<Appointment>,
        offline: std::sync::atomic::AtomicBool,
    }

    impl ItemSource<Appointment> for Flaky {
        fn items(&self, range: &DateRange<Tz>) -> Result<Vec<Arc<Appointment>>> {
            if self.offline.load(Ordering::SeqCst) {
                return Err(Error::from_source("connection reset"));
            }
            self.inner.items(range)
        }
    }

    impl ItemSource<Appointment> for Unreachable {
        fn items(&self, _range: &DateRange<Tz>) -> Result<Vec<Arc<Appointment>>> {
            Err(Error::from_source("connection refused"))
        }
    }

    #[test]
    fn starts_idle() {
        let controller = CalendarController::new(projector(), &config(), Discard);

        assert_eq!(controller.state(), State::Idle);
        assert!(controller.range().is_none());
        assert!(controller.batch().is_empty());
    }

    #[test]
    fn set_items_renders_items_of_visible_month() {
        let (batches, target) = recording();
        let mut controller = controller(target);

        controller
            .set_items(vec![
                appointment("standup", at(2024, 3, 15)),
                appointment("vacation", at(2024, 5, 1)),
                appointment("retro", at(2024, 2, 26)),
            ])
            .unwrap();

        assert_eq!(controller.state(), State::Bound);
        let batches = batches.lock().unwrap();
        // one empty batch for the initial viewport, one for the items
        assert_eq!(batches.len(), 2);
        assert!(batches[0].is_empty());
        assert_eq!(labels(&batches[1]), vec!["standup", "retro"]);
        assert!(batches[1].items.iter().all(|r| r.theme() == ThemeTag::Blue));
    }

    #[test]
    fn viewport_change_requeries() {
        let (batches, target) = recording();
        let mut controller = controller(target);
        controller
            .set_items(vec![
                appointment("march", at(2024, 3, 5)),
                appointment("april", at(2024, 4, 10)),
            ])
            .unwrap();

        // the month is taken in the calendar zone, UTC here
        controller
            .on_viewport_payload("2024-04-02T00:00:00.000+02:00")
            .unwrap();

        assert_eq!(labels(controller.batch()), vec!["april"]);
        assert_eq!(
            controller.range().unwrap().first_day(),
            NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()
        );
        assert_eq!(batches.lock().unwrap().len(), 3);
    }

    #[test]
    fn viewport_month_is_taken_in_calendar_zone() {
        let mut controller = controller(Discard);

        // 22:00 UTC on March 31st
        controller
            .on_viewport_payload("2024-04-01T00:00:00.000+02:00")
            .unwrap();

        assert_eq!(
            controller.range().unwrap().last_day(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()
        );
    }

    #[test]
    fn same_month_keeps_range_and_keys() {
        let mut controller = controller(Discard);
        controller
            .set_items(vec![appointment("standup", at(2024, 3, 15))])
            .unwrap();
        let range = controller.range().cloned();
        let key = controller.batch().items[0].id().to_owned();

        controller.on_viewport_changed(at(2024, 3, 1)).unwrap();
        controller.on_viewport_changed(at(2024, 3, 31)).unwrap();

        assert_eq!(controller.range().cloned(), range);
        assert_eq!(controller.batch().items[0].id(), key);
        assert_eq!(controller.registry().len(), 1);
    }

    #[test]
    fn malformed_viewport_keeps_state() {
        let (batches, target) = recording();
        let mut controller = controller(target);
        controller
            .set_items(vec![appointment("standup", at(2024, 3, 15))])
            .unwrap();
        let range = controller.range().cloned();

        let err = controller.on_viewport_payload("next month").unwrap_err();

        assert!(matches!(err.kind, ErrorKind::DateParse));
        assert_eq!(controller.range().cloned(), range);
        assert_eq!(batches.lock().unwrap().len(), 2);
    }

    #[test]
    fn failed_projection_renders_nothing() {
        let (batches, target) = recording();
        let mut controller = CalendarController::new(
            projector().with_theme(|a: &Appointment| a.theme),
            &config(),
            target,
        );
        controller.on_viewport_changed(at(2024, 3, 15)).unwrap();

        let themed = Appointment {
            theme: Some(ThemeTag::Green),
            ..appointment("themed", at(2024, 3, 4))
        };
        let err = controller
            .set_items(vec![themed, appointment("plain", at(2024, 3, 5))])
            .unwrap_err();

        assert!(matches!(err.kind, ErrorKind::ThemeMissing));
        assert_eq!(controller.state(), State::Idle);
        assert!(controller.batch().is_empty());
        assert_eq!(batches.lock().unwrap().len(), 1);
    }

    #[test]
    fn source_errors_are_propagated() {
        let mut controller = controller(Discard);

        let err = controller.attach_source(Arc::new(Unreachable)).unwrap_err();

        assert!(err.is_source_error());
        assert_eq!(err.to_string(), "item source failed: connection refused");
        assert_eq!(controller.state(), State::Idle);
    }

    #[test]
    fn failed_weekend_toggle_keeps_flag() {
        let (batches, target) = recording();
        let mut controller = controller(target);
        let source = Arc::new(Flaky {
            inner: ListSource::from_items(
                vec![appointment("standup", at(2024, 3, 15))],
                projector().date_fn(),
            ),
            offline: Default::default(),
        });
        controller.attach_source(source.clone()).unwrap();
        source.offline.store(true, Ordering::SeqCst);

        let err = controller.set_hide_weekends(true).unwrap_err();

        assert!(err.is_source_error());
        assert!(!controller.hide_weekends());
        assert!(!controller.batch().hide_weekends);
        assert_eq!(batches.lock().unwrap().len(), 2);

        source.offline.store(false, Ordering::SeqCst);
        controller.refresh().unwrap();
        assert!(!controller.batch().hide_weekends);

        controller.set_hide_weekends(true).unwrap();
        assert!(controller.hide_weekends());
        assert!(controller.batch().hide_weekends);
        assert_eq!(batches.lock().unwrap().len(), 4);
    }

    #[test]
    fn refresh_requires_source() {
        let mut controller = controller(Discard);

        let err = controller.refresh().unwrap_err();

        assert!(matches!(err.kind, ErrorKind::NotBound));
    }

    #[test]
    fn custom_source_fills_every_day() {
        let mut controller = controller(Discard);
        let source = EveryDay {
            date_of: projector().date_fn(),
        };
        controller.attach_source(Arc::new(source)).unwrap();

        let batch = controller.batch();
        assert_eq!(batch.len(), 35);
        assert_eq!(batch.items[0].label(), "26.02.2024");
        assert_eq!(batch.items[34].label(), "31.03.2024");
        assert_eq!(batch.items[0].theme(), ThemeTag::Blue);
    }

    #[test]
    fn activation_resolves_original_item() {
        let mut controller = controller(Discard);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        controller.add_click_listener(move |event: &ItemClicked<Appointment>| {
            sink.lock().unwrap().push(event.item.label.clone())
        });
        controller
            .set_items(vec![appointment("standup", at(2024, 3, 15))])
            .unwrap();
        let key = controller.batch().items[0].id().to_owned();

        let event = controller.on_item_activated(&key).unwrap();
        controller.handle(Event::ItemActivated(key.clone())).unwrap();

        assert_eq!(event.item.label, "standup");
        assert!(Arc::ptr_eq(&event.item, &controller.registry().resolve(&key).unwrap()));
        assert_eq!(*seen.lock().unwrap(), vec!["standup", "standup"]);
    }

    #[test]
    fn unknown_key_is_reported() {
        let mut controller = CalendarController::new(projector(), &config(), Discard);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        controller.add_click_listener(move |_: &ItemClicked<Appointment>| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let err = controller.on_item_activated("999").unwrap_err();

        assert!(matches!(err.kind, ErrorKind::UnknownKey));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn removed_listener_is_not_called() {
        let mut controller = controller(Discard);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let registration = controller.add_click_listener(move |_: &ItemClicked<Appointment>| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        controller
            .set_items(vec![appointment("standup", at(2024, 3, 15))])
            .unwrap();

        assert!(controller.remove_click_listener(registration));
        assert!(!controller.remove_click_listener(registration));
        controller.on_item_activated("1").unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn hide_weekends_rerenders_bound_calendar() {
        let (batches, target) = recording();
        let mut controller = controller(target);
        controller.set_hide_weekends(true).unwrap();
        assert_eq!(batches.lock().unwrap().len(), 1);

        controller
            .set_items(vec![appointment("standup", at(2024, 3, 15))])
            .unwrap();
        controller.set_hide_weekends(false).unwrap();

        let batches = batches.lock().unwrap();
        assert_eq!(batches.len(), 3);
        assert!(batches[1].hide_weekends);
        assert!(!batches[2].hide_weekends);
        assert_eq!(batches[2].len(), 1);
    }

    #[test]
    fn shared_controller_is_usable_across_threads() {
        let shared = controller(Discard).into_shared();
        let worker = Arc::clone(&shared);

        std::thread::spawn(move || {
            worker
                .lock()
                .unwrap()
                .set_items(vec![appointment("standup", at(2024, 3, 15))])
                .unwrap();
        })
        .join()
        .unwrap();

        assert_eq!(shared.lock().unwrap().batch().len(), 1);
    }
}
