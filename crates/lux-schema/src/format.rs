//! # String Formats
//!
//! The closed set of `format` values a schema may declare. Any other
//! value is a definition defect and is rejected when the schema is
//! parsed, so the validator never meets an unknown format.
//!
//! | format      | accepted shape                                   |
//! |-------------|--------------------------------------------------|
//! | `date-time` | RFC 3339 date-time (`2024-03-15T14:30:00Z`)      |
//! | `date`      | RFC 3339 full-date (`2024-03-15`)                |
//! | `time`      | RFC 3339 full-time (`14:30:00Z`, `14:30:00.5+01:00`) |
//! | `email`     | `local@domain`, no whitespace, dotted domain     |
//! | `uri`       | absolute URI with a scheme (`https://…`, `urn:…`) |
//! | `duration`  | ISO 8601 duration (`P3D`, `PT1H30M`, `P1W`)      |

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate};
use regex::Regex;

/// A supported string `format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringFormat {
    /// RFC 3339 date-time.
    DateTime,
    /// RFC 3339 full-date.
    Date,
    /// RFC 3339 full-time.
    Time,
    /// Basic `local@domain` address.
    Email,
    /// Absolute URI.
    Uri,
    /// ISO 8601 duration.
    Duration,
}

impl StringFormat {
    /// Every supported format, in declaration order.
    pub const ALL: [StringFormat; 6] = [
        StringFormat::DateTime,
        StringFormat::Date,
        StringFormat::Time,
        StringFormat::Email,
        StringFormat::Uri,
        StringFormat::Duration,
    ];

    /// The keyword value as written in schema documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            StringFormat::DateTime => "date-time",
            StringFormat::Date => "date",
            StringFormat::Time => "time",
            StringFormat::Email => "email",
            StringFormat::Uri => "uri",
            StringFormat::Duration => "duration",
        }
    }

    /// Whether `s` conforms to this format.
    pub fn matches(&self, s: &str) -> bool {
        match self {
            StringFormat::DateTime => DateTime::parse_from_rfc3339(s).is_ok(),
            StringFormat::Date => is_full_date(s),
            StringFormat::Time => is_full_time(s),
            StringFormat::Email => is_email(s),
            StringFormat::Uri => uri_regex().is_some_and(|re| re.is_match(s)),
            StringFormat::Duration => is_duration(s),
        }
    }
}

impl FromStr for StringFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| UnknownFormat(s.to_string()))
    }
}

impl fmt::Display for StringFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `format` value outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFormat(pub String);

impl fmt::Display for UnknownFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let supported: Vec<&str> = StringFormat::ALL.iter().map(|f| f.as_str()).collect();
        write!(
            f,
            "unsupported format {:?} (supported: {})",
            self.0,
            supported.join(", ")
        )
    }
}

fn is_full_date(s: &str) -> bool {
    // NaiveDate's parser tolerates missing zero padding; RFC 3339 does not.
    s.len() == 10 && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

fn is_full_time(s: &str) -> bool {
    if !s.is_ascii() || s.len() < 9 || s.as_bytes()[2] != b':' {
        return false;
    }
    DateTime::parse_from_rfc3339(&format!("1970-01-01T{s}")).is_ok()
}

fn is_email(s: &str) -> bool {
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}

fn is_duration(s: &str) -> bool {
    // The regex crate has no lookahead, so the "at least one component"
    // and "T must be followed by a component" rules are checked here.
    if s == "P" || s.ends_with('T') {
        return false;
    }
    duration_regex().is_some_and(|re| re.is_match(s))
}

// Compiled once. A pattern that failed to compile matches nothing.
fn uri_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:[^\s]+$").ok())
        .as_ref()
}

fn duration_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^P(?:\d+W|(?:\d+Y)?(?:\d+M)?(?:\d+D)?(?:T(?:\d+H)?(?:\d+M)?(?:\d+(?:\.\d+)?S)?)?)$")
            .ok()
    })
    .as_ref()
}
