use chrono::{
    DateTime, Datelike, Duration, FixedOffset, LocalResult, Month, NaiveDate, NaiveDateTime,
    NaiveTime, Offset, TimeZone, Weekday,
};
use num_traits::FromPrimitive;
use std::borrow::Cow;
use std::fmt::Display;

use super::error::*;

/// Outbound item dates: minute resolution with an explicit offset.
pub const WIRE_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:00%:z";

/// Inbound viewport dates as emitted by the calendar widget.
pub const VIEWPORT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%:z";

// Upper bound for walking out of a DST gap, in quarter hours.
const MAX_GAP_STEPS: usize = 4 * 24;

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).expect("first day of a month is always valid")
}

fn first_of_next_month(month: &Month, year: i32) -> NaiveDate {
    if month.number_from_month() == 12 {
        first_of_month(year + 1, 1)
    } else {
        first_of_month(year, month.number_from_month() + 1)
    }
}

pub fn days_of_month(month: &Month, year: i32) -> u32 {
    first_of_next_month(month, year)
        .signed_duration_since(first_of_month(year, month.number_from_month()))
        .num_days() as u32
}

/// First and last day of the month `date` lies in.
pub fn month_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let month = Month::from_u32(date.month()).expect("chrono months are in 1..=12");
    let first = first_of_month(date.year(), date.month());
    let last = first + Duration::days(days_of_month(&month, date.year()) as i64 - 1);

    (first, last)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Edge {
    Start,
    End,
}

/// Maps a wall-clock time onto `tz`.
///
/// Times inside a DST gap move towards the inside of the day they bound:
/// a start moves forward, an end moves backward. Repeated times pick the
/// instant that keeps the bounded day whole.
fn localize<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime, edge: Edge) -> DateTime<Tz> {
    let step = match edge {
        Edge::Start => Duration::minutes(15),
        Edge::End => Duration::minutes(-15),
    };

    let mut probe = local;
    for _ in 0..=MAX_GAP_STEPS {
        match tz.from_local_datetime(&probe) {
            LocalResult::Single(dt) => return dt,
            LocalResult::Ambiguous(earliest, latest) => {
                return match edge {
                    Edge::Start => earliest,
                    Edge::End => latest,
                }
            }
            LocalResult::None => probe = probe + step,
        }
    }

    unreachable!("no DST gap spans {} quarter hours", MAX_GAP_STEPS)
}

fn start_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(0, 0, 0).expect("midnight is a valid time")
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).expect("valid end of day")
}

/// Contiguous span of whole weeks shown by the month grid.
#[derive(Clone, Debug, PartialEq)]
pub struct DateRange<Tz: TimeZone> {
    from: DateTime<Tz>,
    to: DateTime<Tz>,
}

impl<Tz: TimeZone> DateRange<Tz> {
    pub fn new(from: DateTime<Tz>, to: DateTime<Tz>) -> Result<Self> {
        if from > to {
            return Err(Error::new(
                ErrorKind::InvalidRange,
                "range must not end before it begins",
            ));
        }

        Ok(DateRange { from, to })
    }

    pub fn from(&self) -> &DateTime<Tz> {
        &self.from
    }

    pub fn to(&self) -> &DateTime<Tz> {
        &self.to
    }

    pub fn first_day(&self) -> NaiveDate {
        self.from.naive_local().date()
    }

    pub fn last_day(&self) -> NaiveDate {
        self.to.naive_local().date()
    }

    pub fn num_days(&self) -> i64 {
        self.last_day()
            .signed_duration_since(self.first_day())
            .num_days()
            + 1
    }

    /// Inclusive at both ends. Compares wall-clock times in the range's zone
    /// so that offset changes inside the range cannot push a date across a
    /// day boundary.
    pub fn contains<Tz2: TimeZone>(&self, dt: &DateTime<Tz2>) -> bool {
        let local = dt.with_timezone(&self.from.timezone()).naive_local();
        self.from.naive_local() <= local && local <= self.to.naive_local()
    }
}

/// Computes the month grid for `reference`: the whole month it falls in,
/// widened to full weeks starting on `week_start`.
///
/// Counting happens on calendar days in the reference's own zone, never on
/// elapsed time.
pub fn compute_range<Tz: TimeZone>(
    reference: &DateTime<Tz>,
    week_start: Weekday,
) -> DateRange<Tz> {
    let tz = reference.timezone();
    let week_end = week_start.pred();
    let (first, last) = month_bounds(reference.naive_local().date());

    let mut begin = first;
    while begin.weekday() != week_start {
        begin = begin.pred_opt().expect("date out of range");
    }

    let mut end = last;
    while end.weekday() != week_end {
        end = end.succ_opt().expect("date out of range");
    }

    DateRange {
        from: localize(&tz, begin.and_time(start_of_day()), Edge::Start),
        to: localize(&tz, end.and_time(end_of_day()), Edge::End),
    }
}

pub fn to_fixed<Tz: TimeZone>(dt: &DateTime<Tz>) -> DateTime<FixedOffset> {
    dt.with_timezone(&dt.offset().fix())
}

pub fn format_wire_date<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    dt.format(WIRE_DATE_FORMAT).to_string()
}

/// Strictly parses a viewport date sent by the widget. A trailing `Z` is
/// read as `+00:00`.
pub fn parse_viewport_date(value: &str) -> Result<DateTime<FixedOffset>> {
    let normalized = match value.strip_suffix('Z') {
        Some(rest) => Cow::Owned(format!("{}+00:00", rest)),
        None => Cow::Borrowed(value),
    };

    if !has_viewport_shape(&normalized) {
        return Err(Error::new(
            ErrorKind::DateParse,
            &format!(
                "couldn't parse date for [{}]: expected yyyy-MM-ddTHH:mm:ss.SSS+HH:MM",
                value
            ),
        ));
    }

    DateTime::parse_from_str(&normalized, VIEWPORT_DATE_FORMAT).map_err(|err| {
        Error::new(
            ErrorKind::DateParse,
            &format!("couldn't parse date for [{}]: {}", value, err),
        )
    })
}

// chrono accepts a missing fraction for `%.3f` and `+HHMM` for `%:z`.
fn has_viewport_shape(value: &str) -> bool {
    const TEMPLATE: &[u8] = b"dddd-dd-ddTdd:dd:dd.ddd+dd:dd";

    value.len() == TEMPLATE.len()
        && value
            .bytes()
            .zip(TEMPLATE.iter())
            .all(|(c, &t)| match t {
                b'd' => c.is_ascii_digit(),
                b'+' => c == b'+' || c == b'-',
                _ => c == t,
            })
}
