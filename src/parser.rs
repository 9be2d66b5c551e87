use crate::models::LogRecord;
use chrono::NaiveDateTime;

/// ISO local date-time, second precision, optional fraction.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
/// ISO local date-time without seconds.
pub const MINUTE_FORMAT: &str = "%Y-%m-%dT%H:%M";
/// Exact second precision, used for the `from`/`to` bounds.
pub const SECOND_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The line lacks one of the two space delimiters.
    MissingField(String),
    /// The leading token is not an ISO local date-time.
    Timestamp(String),
}

impl std::error::Error for ParseError {}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::MissingField(line) => {
                write!(f, "Unable to split line '{}' into timestamp, user and message", line)
            }
            ParseError::Timestamp(token) => write!(f, "Unable to parse timestamp '{}'", token),
        }
    }
}

pub fn parse_timestamp(token: &str) -> Result<NaiveDateTime, ParseError> {
    NaiveDateTime::parse_from_str(token, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(token, MINUTE_FORMAT))
        .map_err(|_| ParseError::Timestamp(token.to_owned()))
}

/// Parses one line, rejecting it unless all three fields are present and the
/// timestamp is valid. The parsed timestamp stays cached on the record.
pub fn parse(line: String) -> Result<LogRecord, ParseError> {
    let record = LogRecord::new(line);
    record.timestamp()?;
    if !record.is_complete() {
        return Err(ParseError::MissingField(record.raw().to_owned()));
    }
    Ok(record)
}
