//! Wire format for local date-times (`yyyy-MM-dd HH:mm:ss`).
//!
//! Used through `#[serde(with = ...)]` on every timestamp that crosses the
//! HTTP boundary. Parse failures are reported through
//! [`DateTimeParseError`] so request binding can recover the raw text.
use crate::error::DateTimeParseError;
use chrono::{NaiveDateTime, Timelike};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serializer};

pub const PATTERN_DATETIME: &str = "%Y-%m-%d %H:%M:%S";

/// Current local time truncated to whole seconds, the wire precision.
pub fn now() -> NaiveDateTime {
    let now = chrono::Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

pub fn format(value: &NaiveDateTime) -> String {
    value.format(PATTERN_DATETIME).to_string()
}

pub fn parse(raw: &str) -> Result<NaiveDateTime, DateTimeParseError> {
    NaiveDateTime::parse_from_str(raw, PATTERN_DATETIME).map_err(|source| DateTimeParseError {
        parsed: raw.to_string(),
        source,
    })
}

pub mod datetime {
    use super::*;

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(D::Error::custom)
    }
}

pub mod option_datetime {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => serializer.serialize_some(&format(value)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDateTime>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => parse(&raw).map(Some).map_err(D::Error::custom),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_space_separator() {
        let value = parse("2024-02-29 18:30:00").expect("parse");
        assert_eq!(format(&value), "2024-02-29 18:30:00");
    }

    #[test]
    fn rejects_iso_t_separator() {
        let err = parse("2024-02-29T18:30:00").expect_err("reject");
        assert_eq!(err.parsed, "2024-02-29T18:30:00");
        assert!(err.to_string().starts_with("invalid datetime `2024-02-29T18:30:00`"));
    }
}
