use chrono::NaiveDateTime;
use derive_more::Display;

use crate::{models::LogRecord, parser::SECOND_FORMAT};

/// Filter criteria as given on the command line. `None` or an empty string
/// means "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterConfig {
    pub user: Option<String>,
    pub pattern: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl FilterConfig {
    /// No criteria at all, so there is nothing to filter for.
    pub fn is_empty(&self) -> bool {
        [&self.user, &self.pattern, &self.from, &self.to]
            .into_iter()
            .all(|v| non_empty(v).is_none())
    }
}

#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[display(fmt = "invalid --{} time '{}', expected YYYY-MM-DDTHH:MM:SS", option, value)]
    Time { option: &'static str, value: String },
    #[display(fmt = "unknown time grouping '{}', expected one of h, d, m", _0)]
    TimeRange(String),
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    UserContains(String),
    MessageContains(String),
    /// Strictly after; a record at exactly this instant is rejected.
    After(NaiveDateTime),
    /// Strictly before; a record at exactly this instant is rejected.
    Before(NaiveDateTime),
}

impl Predicate {
    pub fn test(&self, record: &LogRecord) -> bool {
        match self {
            Predicate::UserContains(user) => record.user().contains(user.as_str()),
            Predicate::MessageContains(msg) => record.message().contains(msg.as_str()),
            Predicate::After(from) => record.timestamp().map_or(false, |ts| ts > *from),
            Predicate::Before(to) => record.timestamp().map_or(false, |ts| ts < *to),
        }
    }
}

fn parse_bound(option: &'static str, value: &str) -> Result<NaiveDateTime, ConfigError> {
    NaiveDateTime::parse_from_str(value, SECOND_FORMAT).map_err(|_| {
        ConfigError::Time {
            option,
            value: value.to_owned(),
        }
    })
}

/// Ordered conjunction of predicates: user, message, from, to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PredicateSet {
    predicates: Vec<Predicate>,
}

impl PredicateSet {
    pub fn build(config: &FilterConfig) -> Result<Self, ConfigError> {
        let mut predicates = Vec::new();
        if let Some(user) = non_empty(&config.user) {
            predicates.push(Predicate::UserContains(user.to_owned()));
        }
        if let Some(pattern) = non_empty(&config.pattern) {
            predicates.push(Predicate::MessageContains(pattern.to_owned()));
        }
        if let Some(from) = non_empty(&config.from) {
            predicates.push(Predicate::After(parse_bound("from", from)?));
        }
        if let Some(to) = non_empty(&config.to) {
            predicates.push(Predicate::Before(parse_bound("to", to)?));
        }
        Ok(PredicateSet { predicates })
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// An empty set matches everything.
    pub fn matches(&self, record: &LogRecord) -> bool {
        self.predicates.iter().all(|p| p.test(record))
    }
}
