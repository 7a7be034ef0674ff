//! Wire shapes for error responses.
//!
//! Field names are consumed by external clients and must stay exactly as
//! serialized here: `property`, `value`, `constraint{name, messageKey,
//! messageBundle, messageParams}` and `timestamp`, `code`, `message`.
use crate::error::codes;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// One rejected input value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ValidationError {
    pub property: String,
    #[schema(value_type = Object)]
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<Constraint>,
}

impl ValidationError {
    /// Error for `property` that violated the constraint `name`.
    pub fn new(property: impl Into<String>, value: Value, name: &str) -> Self {
        Self::with_params(property, value, name, Vec::<(&'static str, Value)>::new())
    }

    /// Like [`ValidationError::new`] with category-specific parameters.
    ///
    /// `value` is always added to the parameters under `"value"`.
    pub fn with_params<I>(property: impl Into<String>, value: Value, name: &str, params: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, Value)>,
    {
        let mut constraint = Constraint::named(name);
        for (key, param) in params {
            constraint.message_params.insert(key.to_string(), param);
        }
        constraint
            .message_params
            .insert(codes::PARAM_VALUE.to_string(), value.clone());
        Self {
            property: property.into(),
            value,
            constraint: Some(constraint),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Constraint {
    pub name: String,
    pub message_key: String,
    pub message_bundle: String,
    #[schema(value_type = Object)]
    pub message_params: BTreeMap<String, Value>,
}

impl Constraint {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            message_key: format!("{}.constraints.{name}.message", codes::MESSAGE_NAMESPACE),
            message_bundle: codes::MESSAGE_BUNDLE.to_string(),
            message_params: BTreeMap::new(),
        }
    }
}

/// Failure that is not tied to a single field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeneralError {
    #[serde(with = "crate::time::datetime")]
    #[schema(value_type = String, example = "2024-01-31 09:15:00")]
    pub timestamp: NaiveDateTime,
    pub code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl GeneralError {
    pub fn new(code: u16, message: Option<String>) -> Self {
        Self {
            timestamp: crate::time::now(),
            code,
            message,
        }
    }
}
