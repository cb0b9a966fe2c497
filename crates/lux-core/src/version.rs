//! # Schema Versions
//!
//! Signal schemas are versioned as `major.minor`. Versions are compared
//! numerically component by component, never lexicographically: `1.10`
//! is newer than `1.9`, and `2.0` is newer than both.
//!
//! ## Invariant
//!
//! `Display` reproduces the parsed input exactly. Leading zeros
//! (`1.01`) are rejected so that two distinct strings can never name the
//! same version key in a registry.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

/// A `major.minor` schema version with numeric ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SchemaVersion {
    major: u32,
    minor: u32,
}

impl SchemaVersion {
    /// Construct a version from its components.
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Parse a `major.minor` string.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidVersion`] when the input does not have
    /// exactly two dot-separated, non-negative decimal components.
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        let invalid = |reason: &str| CoreError::InvalidVersion {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let (major, minor) = input
            .split_once('.')
            .ok_or_else(|| invalid("expected the form major.minor"))?;

        Ok(Self {
            major: parse_component(major).map_err(|r| invalid(r))?,
            minor: parse_component(minor).map_err(|r| invalid(r))?,
        })
    }

    /// The major component.
    pub fn major(&self) -> u32 {
        self.major
    }

    /// The minor component.
    pub fn minor(&self) -> u32 {
        self.minor
    }
}

fn parse_component(part: &str) -> Result<u32, &'static str> {
    if part.is_empty() {
        return Err("version components must not be empty");
    }
    if !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err("version components must be decimal digits");
    }
    if part.len() > 1 && part.starts_with('0') {
        return Err("version components must not have leading zeros");
    }
    part.parse::<u32>()
        .map_err(|_| "version component out of range")
}

impl FromStr for SchemaVersion {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl Serialize for SchemaVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SchemaVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Display and parse are inverse for every representable version.
        #[test]
        fn display_parse_roundtrip(major in any::<u32>(), minor in any::<u32>()) {
            let v = SchemaVersion::new(major, minor);
            prop_assert_eq!(SchemaVersion::parse(&v.to_string()).unwrap(), v);
        }

        /// Ordering agrees with comparing the numeric tuple.
        #[test]
        fn ordering_matches_tuple(a in any::<(u32, u32)>(), b in any::<(u32, u32)>()) {
            let va = SchemaVersion::new(a.0, a.1);
            let vb = SchemaVersion::new(b.0, b.1);
            prop_assert_eq!(va.cmp(&vb), a.cmp(&b));
        }
    }
}
