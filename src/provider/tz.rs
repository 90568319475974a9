use chrono::{FixedOffset, LocalResult, NaiveDate, NaiveDateTime, Offset, TimeZone};
use chrono_tz::{OffsetComponents, OffsetName};
use serde_with::DeserializeFromStr;
use std::fmt::Display;
use std::str::FromStr;

use super::error::*;

#[derive(Clone, Debug, PartialEq)]
pub struct TzOffset {
    tz: Tz,
    pub utc_offset_secs: i32,
    pub dst_offset_secs: i32,
    pub id: String,
    pub name: Option<String>,
}

impl Offset for TzOffset {
    fn fix(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_secs + self.dst_offset_secs)
            .expect("Seconds should be in range")
    }
}

impl Display for TzOffset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name.as_deref().unwrap_or(self.id.as_str()))
    }
}

/// Time zone a calendar lays out its days in.
///
/// `Local` follows the host's zone, which is what a server-side component
/// without further configuration uses.
#[derive(Clone, Copy, Debug, Default, DeserializeFromStr, PartialEq)]
pub enum Tz {
    #[default]
    Local,
    Iana(chrono_tz::Tz),
}

impl Tz {
    const LOCAL_ID: &'static str = "Localtime";

    pub fn utc() -> Self {
        Self::Iana(chrono_tz::UTC)
    }

    pub fn id(&self) -> &str {
        match self {
            Tz::Local => Self::LOCAL_ID,
            Tz::Iana(tz) => tz.name(),
        }
    }

    fn local_offset(&self, offs: FixedOffset) -> TzOffset {
        TzOffset {
            tz: *self,
            utc_offset_secs: offs.local_minus_utc(),
            dst_offset_secs: 0,
            id: Self::LOCAL_ID.to_string(),
            name: None,
        }
    }

    fn iana_offset(&self, offs: &<chrono_tz::Tz as TimeZone>::Offset) -> TzOffset {
        TzOffset {
            tz: *self,
            utc_offset_secs: offs.base_utc_offset().num_seconds() as i32,
            dst_offset_secs: offs.dst_offset().num_seconds() as i32,
            id: offs.tz_id().to_owned(),
            name: Some(offs.abbreviation().to_owned()),
        }
    }
}

impl TimeZone for Tz {
    type Offset = TzOffset;

    fn from_offset(offset: &Self::Offset) -> Self {
        offset.tz
    }

    fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<Self::Offset> {
        match self {
            Tz::Local => chrono::Local
                .offset_from_local_date(local)
                .map(|offs| self.local_offset(offs)),
            Tz::Iana(tz) => tz
                .offset_from_local_date(local)
                .map(|offs| self.iana_offset(&offs)),
        }
    }

    fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<Self::Offset> {
        match self {
            Tz::Local => chrono::Local
                .offset_from_local_datetime(local)
                .map(|offs| self.local_offset(offs)),
            Tz::Iana(tz) => tz
                .offset_from_local_datetime(local)
                .map(|offs| self.iana_offset(&offs)),
        }
    }

    fn offset_from_utc_date(&self, utc: &NaiveDate) -> Self::Offset {
        match self {
            Tz::Local => self.local_offset(chrono::Local.offset_from_utc_date(utc)),
            Tz::Iana(tz) => self.iana_offset(&tz.offset_from_utc_date(utc)),
        }
    }

    fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> Self::Offset {
        match self {
            Tz::Local => self.local_offset(chrono::Local.offset_from_utc_datetime(utc)),
            Tz::Iana(tz) => self.iana_offset(&tz.offset_from_utc_datetime(utc)),
        }
    }
}

impl FromStr for Tz {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case(Self::LOCAL_ID) || s.eq_ignore_ascii_case("local") {
            return Ok(Tz::Local);
        }

        s.parse::<chrono_tz::Tz>().map(Tz::Iana).map_err(|err| {
            Error::new(
                ErrorKind::ConfigParse,
                &format!("unknown timezone '{}': {}", s, err),
            )
        })
    }
}

impl Display for Tz {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}
