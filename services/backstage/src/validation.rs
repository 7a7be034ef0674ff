//! Declarative constraints on bound request payloads.
//!
//! Payload types implement [`Validate`] by feeding their fields through a
//! [`Validator`]; every violated constraint becomes one [`ValidationError`]
//! and the whole list is raised as [`ConstraintViolations`].
use crate::error::{ValidationError, codes};
use chrono::NaiveDateTime;
use serde_json::{Value, json};
use thiserror::Error;

pub trait Validate {
    fn validate(&self) -> Result<(), ConstraintViolations>;
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{} constraint violation(s)", .0.len())]
pub struct ConstraintViolations(pub Vec<ValidationError>);

#[derive(Debug, Default)]
pub struct Validator {
    prefix: String,
    errors: Vec<ValidationError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    fn property(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}.{name}", self.prefix)
        }
    }

    fn reject(&mut self, name: &str, value: Value, constraint: &str) {
        let property = self.property(name);
        self.errors
            .push(ValidationError::new(property, value, constraint));
    }

    pub fn not_blank(&mut self, name: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.reject(name, json!(value), codes::NOT_BLANK);
        }
        self
    }

    /// Absent is fine; present must not be blank.
    pub fn not_blank_if_present(&mut self, name: &str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value {
            self.not_blank(name, value);
        }
        self
    }

    pub fn not_null<T>(&mut self, name: &str, value: Option<&T>) -> &mut Self {
        if value.is_none() {
            self.reject(name, Value::Null, codes::NOT_NULL);
        }
        self
    }

    pub fn not_empty<T>(&mut self, name: &str, items: &[T]) -> &mut Self {
        if items.is_empty() {
            self.reject(name, json!([]), codes::NOT_EMPTY);
        }
        self
    }

    /// `start` must not come after `end`.
    pub fn date_range(&mut self, name: &str, start: NaiveDateTime, end: NaiveDateTime) -> &mut Self {
        if start > end {
            let value = json!({
                "start": crate::time::format(&start),
                "end": crate::time::format(&end),
            });
            self.reject(name, value, codes::INVALID_DATE_RANGE);
        }
        self
    }

    /// Validate `items[i]` with properties prefixed `name[i]`.
    pub fn each<T>(
        &mut self,
        name: &str,
        items: &[T],
        mut check: impl FnMut(&mut Validator, &T),
    ) -> &mut Self {
        for (index, item) in items.iter().enumerate() {
            let mut nested = Validator {
                prefix: format!("{}[{index}]", self.property(name)),
                errors: Vec::new(),
            };
            check(&mut nested, item);
            self.errors.append(&mut nested.errors);
        }
        self
    }

    pub fn finish(&mut self) -> Result<(), ConstraintViolations> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ConstraintViolations(std::mem::take(&mut self.errors)))
        }
    }
}
