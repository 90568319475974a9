use phf::phf_map;
use serde::{Serialize, Serializer};
use serde_with::DeserializeFromStr;
use std::fmt;
use std::str::FromStr;

use crate::provider::{Error, ErrorKind};

/// Color scheme of a rendered calendar item.
#[derive(Clone, Copy, Debug, Default, DeserializeFromStr, PartialEq, Eq, Hash)]
pub enum ThemeTag {
    #[default]
    Blue,
    Green,
    Red,
    Black,
    LightBlue,
    LightGreen,
    LightRed,
    Gray,
}

static THEME_TAGS: phf::Map<&'static str, ThemeTag> = phf_map! {
    "blue" => ThemeTag::Blue,
    "green" => ThemeTag::Green,
    "red" => ThemeTag::Red,
    "black" => ThemeTag::Black,
    "lightblue" => ThemeTag::LightBlue,
    "lightgreen" => ThemeTag::LightGreen,
    "lightred" => ThemeTag::LightRed,
    "gray" => ThemeTag::Gray,
};

impl ThemeTag {
    pub const ALL: [ThemeTag; 8] = [
        ThemeTag::Blue,
        ThemeTag::Green,
        ThemeTag::Red,
        ThemeTag::Black,
        ThemeTag::LightBlue,
        ThemeTag::LightGreen,
        ThemeTag::LightRed,
        ThemeTag::Gray,
    ];

    /// Style token understood by the calendar widget.
    pub fn theme_name(&self) -> &'static str {
        match self {
            ThemeTag::Blue => "primary",
            ThemeTag::Green => "primary success",
            ThemeTag::Red => "primary error",
            ThemeTag::Black => "primary contrast",
            ThemeTag::LightBlue => "",
            ThemeTag::LightGreen => "success",
            ThemeTag::LightRed => "error",
            ThemeTag::Gray => "contrast",
        }
    }
}

impl FromStr for ThemeTag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();

        THEME_TAGS.get(key.as_str()).copied().ok_or_else(|| {
            Error::new(ErrorKind::ConfigParse, &format!("unknown theme '{}'", s))
        })
    }
}

impl fmt::Display for ThemeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl Serialize for ThemeTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.theme_name())
    }
}
