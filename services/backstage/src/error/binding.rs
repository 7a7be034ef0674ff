//! Request-body binding failures.
//!
//! # Purpose
//! Translates `serde_path_to_error` failures into a typed [`BindingError`]
//! that keeps the location of the offending value, so the normalizer can
//! report a field path instead of a parser message.
//!
//! # Notes
//! Bodies are first parsed into a [`serde_json::Value`] and only then bound to
//! the target type. Syntax problems therefore surface as
//! [`BindingError::Malformed`] while everything else carries a path and the
//! raw value can be looked up in the parsed tree.
use crate::time::PATTERN_DATETIME;
use serde_json::Value;
use serde_path_to_error::Segment;
use std::fmt::Write as _;
use thiserror::Error;

/// One step from the document root to a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

/// Render segments as `field[1].second.third[6]`.
pub fn build_path(segments: &[PathSegment]) -> String {
    let mut path = String::new();
    for segment in segments {
        match segment {
            PathSegment::Field(name) => {
                path.push('.');
                path.push_str(name);
            }
            PathSegment::Index(index) => {
                let _ = write!(path, "[{index}]");
            }
        }
    }
    match path.strip_prefix('.') {
        Some(stripped) => stripped.to_string(),
        None => path,
    }
}

/// A date-time string that does not match [`PATTERN_DATETIME`].
#[derive(Debug, Error)]
#[error("invalid datetime `{parsed}`: {source}")]
pub struct DateTimeParseError {
    pub parsed: String,
    #[source]
    pub source: chrono::ParseError,
}

/// What the malformed value was supposed to become.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatTarget {
    Enum { allowed: Vec<String> },
    Scalar,
}

#[derive(Debug, Error)]
pub enum BindingError {
    #[error("missing required field `{}`", build_path(.path))]
    MissingField { path: Vec<PathSegment> },
    #[error("invalid value for `{}`", build_path(.path))]
    InvalidFormat {
        path: Vec<PathSegment>,
        value: Value,
        target: FormatTarget,
        #[source]
        cause: Option<DateTimeParseError>,
    },
    #[error("unknown type id `{type_id}` at `{}`", build_path(.path))]
    UnknownTypeTag {
        path: Vec<PathSegment>,
        type_id: String,
    },
    #[error("expected {expected_type} at `{}`", build_path(.path))]
    TypeMismatch {
        path: Vec<PathSegment>,
        expected_type: String,
    },
    #[error("malformed request body: {message}")]
    Malformed { message: String },
}

const DATETIME_MARKER: &str = "invalid datetime `";

/// Discriminator key of internally tagged payloads (`#[serde(tag = "@type")]`).
pub const TYPE_TAG_FIELD: &str = "@type";

impl BindingError {
    /// Classify a failure raised while binding `raw` to a typed payload.
    ///
    /// Only message prefixes are matched. Anything the caller sent is read
    /// back from `raw` so user text cannot steer the classification.
    pub fn from_json(err: serde_path_to_error::Error<serde_json::Error>, raw: &Value) -> Self {
        let mut path: Vec<PathSegment> = err
            .path()
            .iter()
            .filter_map(|segment| match segment {
                Segment::Seq { index } => Some(PathSegment::Index(*index)),
                Segment::Map { key } => Some(PathSegment::Field(key.clone())),
                Segment::Enum { variant } => Some(PathSegment::Field(variant.clone())),
                Segment::Unknown => None,
            })
            .collect();
        let message = err.into_inner().to_string();

        if message.starts_with("missing field `") {
            if let Some(field) = between(&message, "missing field `", "`") {
                path.push(PathSegment::Field(field.to_string()));
            }
            return BindingError::MissingField { path };
        }

        // A null for a required value counts as absent.
        if message.starts_with("invalid type: null") {
            return BindingError::MissingField { path };
        }

        let found = value_at(raw, &path).cloned();

        if message.starts_with(DATETIME_MARKER) {
            let raw_datetime = match &found {
                Some(Value::String(text)) => text.clone(),
                _ => String::new(),
            };
            let cause = chrono::NaiveDateTime::parse_from_str(&raw_datetime, PATTERN_DATETIME)
                .err()
                .map(|source| DateTimeParseError {
                    parsed: raw_datetime.clone(),
                    source,
                });
            return BindingError::InvalidFormat {
                path,
                value: Value::String(raw_datetime),
                target: FormatTarget::Scalar,
                cause,
            };
        }

        if message.starts_with("unknown variant `") {
            let names_tag = matches!(path.last(), Some(PathSegment::Field(key)) if key == TYPE_TAG_FIELD);
            match found {
                Some(Value::String(variant)) if names_tag => {
                    path.pop();
                    return BindingError::UnknownTypeTag {
                        path,
                        type_id: variant,
                    };
                }
                Some(Value::String(variant)) => {
                    let allowed = message
                        .rsplit_once(", expected ")
                        .map(|(_, expected)| backticked(expected))
                        .unwrap_or_default();
                    return BindingError::InvalidFormat {
                        path,
                        value: Value::String(variant),
                        target: FormatTarget::Enum { allowed },
                        cause: None,
                    };
                }
                // The tag sits inside the object or, externally tagged, is
                // its single key.
                other => {
                    let object = other.as_ref().and_then(Value::as_object);
                    let type_id = object
                        .and_then(|object| object.get(TYPE_TAG_FIELD))
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .or_else(|| object.and_then(|object| object.keys().next().cloned()))
                        .unwrap_or_default();
                    return BindingError::UnknownTypeTag { path, type_id };
                }
            }
        }

        if message.starts_with("invalid type: ") {
            let expected = message
                .rsplit_once(", expected ")
                .map(|(_, expected)| simple_type_name(expected))
                .unwrap_or_default();
            return BindingError::TypeMismatch {
                path,
                expected_type: expected,
            };
        }

        BindingError::InvalidFormat {
            path,
            value: found.unwrap_or(Value::Null),
            target: FormatTarget::Scalar,
            cause: None,
        }
    }

    /// The body is not parseable JSON at all.
    pub fn malformed(err: &serde_json::Error) -> Self {
        BindingError::Malformed {
            message: err.to_string(),
        }
    }
}

fn between<'a>(text: &'a str, start: &str, end: &str) -> Option<&'a str> {
    let (_, rest) = text.split_once(start)?;
    rest.split_once(end).map(|(inner, _)| inner)
}

fn backticked(text: &str) -> Vec<String> {
    text.split('`')
        .skip(1)
        .step_by(2)
        .map(str::to_string)
        .collect()
}

/// `"struct CreateAward"` -> `CreateAward`, `"a boolean"` -> `boolean`.
fn simple_type_name(expected: &str) -> String {
    let last_word = expected.split_whitespace().last().unwrap_or(expected);
    let unqualified = last_word
        .rsplit("::")
        .next()
        .unwrap_or(last_word)
        .rsplit('.')
        .next()
        .unwrap_or(last_word);
    unqualified.trim_matches('`').to_string()
}

fn value_at<'a>(root: &'a Value, path: &[PathSegment]) -> Option<&'a Value> {
    path.iter().try_fold(root, |value, segment| match segment {
        PathSegment::Field(name) => value.get(name.as_str()),
        PathSegment::Index(index) => value.get(*index),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Outer {
        name: String,
        items: Vec<Inner>,
    }

    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Inner {
        count: u32,
        colour: Colour,
        #[serde(with = "crate::time::datetime")]
        at: chrono::NaiveDateTime,
    }

    #[derive(Debug, Deserialize)]
    enum Colour {
        Red,
        Green,
    }

    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Holder {
        shape: Shape,
    }

    #[derive(Debug, Deserialize)]
    #[serde(tag = "@type")]
    #[allow(dead_code)]
    enum Shape {
        Circle { radius: f64 },
        Square { side: f64 },
    }

    fn bind<T: serde::de::DeserializeOwned>(raw: Value) -> BindingError {
        match serde_path_to_error::deserialize::<_, T>(&raw) {
            Ok(_) => panic!("binding unexpectedly succeeded"),
            Err(err) => BindingError::from_json(err, &raw),
        }
    }

    fn item() -> Value {
        json!({"count": 1, "colour": "Red", "at": "2024-01-01 10:00:00"})
    }

    #[test]
    fn path_of_named_and_indexed_segments() {
        let segments = vec![
            PathSegment::Field("field".to_string()),
            PathSegment::Index(1),
            PathSegment::Field("second".to_string()),
            PathSegment::Field("third".to_string()),
            PathSegment::Index(6),
        ];
        assert_eq!(build_path(&segments), "field[1].second.third[6]");
        assert_eq!(build_path(&[PathSegment::Index(0)]), "[0]");
        assert_eq!(build_path(&[]), "");
    }

    #[test]
    fn missing_field_appends_name() {
        match bind::<Outer>(json!({"items": []})) {
            BindingError::MissingField { path } => assert_eq!(build_path(&path), "name"),
            other => panic!("unexpected {other:?}"),
        }

        let mut nested = item();
        nested.as_object_mut().expect("object").remove("count");
        match bind::<Outer>(json!({"name": "n", "items": [item(), nested]})) {
            BindingError::MissingField { path } => assert_eq!(build_path(&path), "items[1].count"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_enum_value_lists_allowed() {
        let mut bad = item();
        bad["colour"] = json!("Blue");
        match bind::<Outer>(json!({"name": "n", "items": [bad]})) {
            BindingError::InvalidFormat {
                path,
                value,
                target: FormatTarget::Enum { allowed },
                cause: None,
            } => {
                assert_eq!(build_path(&path), "items[0].colour");
                assert_eq!(value, json!("Blue"));
                assert_eq!(allowed, vec!["Red".to_string(), "Green".to_string()]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn bad_datetime_keeps_raw_text() {
        let mut bad = item();
        bad["at"] = json!("2024-01-01T10:00:00");
        match bind::<Outer>(json!({"name": "n", "items": [bad]})) {
            BindingError::InvalidFormat {
                path,
                value,
                cause: Some(cause),
                ..
            } => {
                assert_eq!(build_path(&path), "items[0].at");
                assert_eq!(value, json!("2024-01-01T10:00:00"));
                assert_eq!(cause.parsed, "2024-01-01T10:00:00");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn wrong_shape_reports_expected_type() {
        match bind::<Outer>(json!({"name": ["not", "a", "string"], "items": []})) {
            BindingError::TypeMismatch {
                path,
                expected_type,
            } => {
                assert_eq!(build_path(&path), "name");
                assert_eq!(expected_type, "string");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_tag_on_object_is_type_tag() {
        match bind::<Holder>(json!({"shape": {"@type": "Triangle", "side": 2.0}})) {
            BindingError::UnknownTypeTag { path, type_id } => {
                assert_eq!(build_path(&path), "shape");
                assert_eq!(type_id, "Triangle");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn null_for_required_field_is_missing() {
        match bind::<Outer>(json!({"name": null, "items": []})) {
            BindingError::MissingField { path } => assert_eq!(build_path(&path), "name"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn backticks_in_values_do_not_change_the_category() {
        let mut bad = item();
        bad["colour"] = json!("missing field `x`");
        match bind::<Outer>(json!({"name": "n", "items": [bad]})) {
            BindingError::InvalidFormat {
                path,
                value,
                target: FormatTarget::Enum { allowed },
                ..
            } => {
                assert_eq!(build_path(&path), "items[0].colour");
                assert_eq!(value, json!("missing field `x`"));
                assert_eq!(allowed, vec!["Red".to_string(), "Green".to_string()]);
            }
            other => panic!("unexpected {other:?}"),
        }

        let mut bad = item();
        bad["at"] = json!("2024-01`01 10:00:00");
        match bind::<Outer>(json!({"name": "n", "items": [bad]})) {
            BindingError::InvalidFormat {
                value,
                cause: Some(cause),
                ..
            } => {
                assert_eq!(value, json!("2024-01`01 10:00:00"));
                assert_eq!(cause.parsed, "2024-01`01 10:00:00");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_variant_named_type_is_still_an_enum_value() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct Kinded {
            #[serde(rename = "type")]
            kind: Colour,
        }

        match bind::<Kinded>(json!({"type": "Triangle"})) {
            BindingError::InvalidFormat {
                path,
                target: FormatTarget::Enum { .. },
                ..
            } => assert_eq!(build_path(&path), "type"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn simple_type_names() {
        assert_eq!(simple_type_name("struct CreateAward"), "CreateAward");
        assert_eq!(simple_type_name("a boolean"), "boolean");
        assert_eq!(simple_type_name("i64"), "i64");
        assert_eq!(simple_type_name("org.backstage.Award"), "Award");
    }
}
