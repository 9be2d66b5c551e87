use chrono::NaiveDateTime;
use once_cell::unsync::OnceCell;

use crate::parser::{parse_timestamp, ParseError};

/// Granularity of a time bucket.
///
/// A bucket key is the raw timestamp token truncated to `prefix_len()`
/// characters, so `2023-01-01T10:00:00` lands in `2023-01-01T10` for
/// `Hour` and in `2023-01` for `Month`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeRange {
    Second,
    Hour,
    Day,
    Month,
}

impl TimeRange {
    pub const fn prefix_len(self) -> usize {
        match self {
            TimeRange::Second => 19,
            TimeRange::Hour => 13,
            TimeRange::Day => 10,
            TimeRange::Month => 7,
        }
    }

    /// Maps the command line group-by code (`h`, `d`, `m`).
    pub fn from_code(code: &str) -> Option<TimeRange> {
        match code {
            "h" => Some(TimeRange::Hour),
            "d" => Some(TimeRange::Day),
            "m" => Some(TimeRange::Month),
            _ => None,
        }
    }
}

/// One raw log line of the shape `<timestamp> <user> <message>`.
///
/// Only the two delimiter offsets are computed up front; the fields are
/// borrowed from the raw line on access and the timestamp is parsed once,
/// on first use.
#[derive(Debug, Clone)]
pub struct LogRecord {
    raw: String,
    user_at: Option<usize>,
    message_at: Option<usize>,
    timestamp: OnceCell<Result<NaiveDateTime, ParseError>>,
}

impl LogRecord {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let user_at = raw.find(' ');
        let message_at = user_at.and_then(|at| raw[at + 1..].find(' ').map(|rel| at + 1 + rel));
        LogRecord {
            raw,
            user_at,
            message_at,
            timestamp: OnceCell::new(),
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Both delimiters are present, so all three fields exist.
    pub fn is_complete(&self) -> bool {
        self.message_at.is_some()
    }

    pub fn timestamp_str(&self) -> &str {
        match self.user_at {
            Some(at) => &self.raw[..at],
            None => &self.raw,
        }
    }

    pub fn user(&self) -> &str {
        match (self.user_at, self.message_at) {
            (Some(from), Some(to)) => &self.raw[from + 1..to],
            _ => "",
        }
    }

    pub fn message(&self) -> &str {
        match self.message_at {
            Some(at) => &self.raw[at + 1..],
            None => "",
        }
    }

    pub fn timestamp(&self) -> Result<NaiveDateTime, ParseError> {
        self.timestamp
            .get_or_init(|| match self.user_at {
                Some(_) => parse_timestamp(self.timestamp_str()),
                None => Err(ParseError::MissingField(self.raw.clone())),
            })
            .clone()
    }

    /// Bucket key: the raw timestamp token cut down to `range`.
    pub fn bucket(&self, range: TimeRange) -> &str {
        let ts = self.timestamp_str();
        ts.get(..range.prefix_len()).unwrap_or(ts)
    }
}
