//! Constraint names carried in validation errors.
//!
//! These strings are part of the wire contract; clients key translations on
//! them through the derived message key.

pub const NOT_NULL: &str = "NotNull";
pub const NOT_MISSING: &str = "NotMissing";
pub const NOT_BLANK: &str = "NotBlank";
pub const NOT_EMPTY: &str = "NotEmpty";
pub const INVALID_FORMAT: &str = "InvalidFormat";
pub const INVALID_DATETIME_FORMAT: &str = "InvalidDateTime";
pub const INVALID_DATE_RANGE: &str = "InvalidDateRange";
pub const INVALID_ENUM_VALUE: &str = "UnknownValue";
pub const INVALID_JSON_TYPE: &str = "InvalidTypeId";
pub const INCORRECT_TYPE: &str = "IncorrectType";

/// Prefix of every message key: `<namespace>.constraints.<name>.message`.
pub const MESSAGE_NAMESPACE: &str = "org.backstage";
pub const MESSAGE_BUNDLE: &str = "org/backstage/messages";

pub const PARAM_VALUE: &str = "value";
pub const PARAM_ALLOWED_VALUE: &str = "allowedValue";
pub const PARAM_EXPECTED_TYPE: &str = "expectedType";
