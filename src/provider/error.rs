use std::convert::From;
use std::error;
use std::fmt;
use std::io;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub message: Option<String>,
}

#[derive(Debug)]
pub enum ErrorKind {
    LabelMissing,
    DateMissing,
    ThemeMissing,
    UnknownKey,
    DateParse,
    Protocol,
    InvalidRange,
    NotBound,
    ConfigParse,
    Source(Box<dyn error::Error + Send + Sync>),
    IOError(io::Error),
}

impl Error {
    pub fn new(kind: ErrorKind, msg: &str) -> Self {
        Error {
            kind,
            message: Some(msg.to_owned()),
        }
    }

    pub fn with_msg(mut self, message: &str) -> Self {
        self.message = Some(message.to_owned());
        self
    }

    /// Wraps a failure raised inside an `ItemSource` implementation.
    pub fn from_source<E>(err: E) -> Self
    where
        E: Into<Box<dyn error::Error + Send + Sync>>,
    {
        Error::from(ErrorKind::Source(err.into()))
    }

    /// A required extractor returned nothing for an item.
    pub fn is_contract_error(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::LabelMissing | ErrorKind::DateMissing | ErrorKind::ThemeMissing
        )
    }

    /// Malformed or stale input coming from the client side.
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::UnknownKey | ErrorKind::DateParse | ErrorKind::Protocol
        )
    }

    pub fn is_source_error(&self) -> bool {
        matches!(self.kind, ErrorKind::Source(_))
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error {
            kind,
            message: None,
        }
    }
}

impl From<io::ErrorKind> for Error {
    fn from(kind: io::ErrorKind) -> Error {
        Error::from(io::Error::from(kind))
    }
}

impl From<chrono::ParseError> for Error {
    fn from(parse_error: chrono::ParseError) -> Error {
        Error::new(
            ErrorKind::DateParse,
            format!("Could not parse timestamp: {}", parse_error).as_str(),
        )
    }
}

impl From<io::Error> for Error {
    fn from(io_error: io::Error) -> Error {
        Error::from(ErrorKind::IOError(io_error))
    }
}

impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Error::new(ErrorKind::ConfigParse, &error.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::new(
            ErrorKind::Protocol,
            &format!("Invalid event payload: {}", error),
        )
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        if let ErrorKind::IOError(err) = err.kind {
            err
        } else {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                err.to_string(),
            )
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(msg) => write!(f, "{}: {}", self.kind.as_str(), msg),
            None => write!(f, "{}", self.kind.as_str()),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match &self.kind {
            ErrorKind::Source(err) => Some(err.as_ref()),
            ErrorKind::IOError(err) => Some(err),
            _ => None,
        }
    }
}

impl ErrorKind {
    pub fn as_str(&self) -> String {
        match self {
            ErrorKind::LabelMissing => "missing label for calendar item".to_owned(),
            ErrorKind::DateMissing => "missing date for calendar item".to_owned(),
            ErrorKind::ThemeMissing => "missing theme for calendar item".to_owned(),
            ErrorKind::UnknownKey => "unknown item key".to_owned(),
            ErrorKind::DateParse => "invalid date format".to_owned(),
            ErrorKind::Protocol => "invalid client event".to_owned(),
            ErrorKind::InvalidRange => "invalid date range".to_owned(),
            ErrorKind::NotBound => "no item source attached".to_owned(),
            ErrorKind::ConfigParse => "invalid configuration".to_owned(),
            ErrorKind::Source(err) => format!("item source failed: {}", err),
            ErrorKind::IOError(err) => err.to_string(),
        }
    }
}
