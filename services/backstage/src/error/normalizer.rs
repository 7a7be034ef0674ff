//! Failure classification and response building.
//!
//! # Purpose
//! [`normalize`] turns any failure raised while handling a request into a
//! status code and one of two JSON bodies: a [`GeneralError`] or a list of
//! [`ValidationError`]s.
//!
//! # Key invariants
//! - Total: every input, including no failure at all, yields a reply.
//! - The chain is walked from the top-level failure towards its root cause;
//!   the first link with a known type decides the reply.
//! - The walk stops when a link reports itself as its own cause or after
//!   [`MAX_CAUSE_DEPTH`] links.
//! - Only unknown, invalid-argument and transport failures log at error
//!   level; storage constraint violations log at warn; nothing else logs.
use super::codes;
use super::{
    BindingError, FormatTarget, GeneralError, HttpError, InvalidArgument, MethodNotAllowed,
    NotImplemented, ValidationError, build_path,
};
use crate::store::StoreError;
use crate::validation::ConstraintViolations;
use axum::Json;
use axum::http::header::ALLOW;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use backstage_authz::Unauthorized;
use serde::Serialize;
use serde_json::{Value, json};
use std::error::Error;

pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown and unhandled error has occurred";
pub const NOT_IMPLEMENTED_MESSAGE: &str = "Method not implemented";
const ACCESS_DENIED_MESSAGE: &str = "Access denied";
const MAX_CAUSE_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ErrorBody {
    General(GeneralError),
    Validation(Vec<ValidationError>),
}

/// Status, body and extra headers for one failed request.
#[derive(Debug)]
pub struct ErrorReply {
    pub status: StatusCode,
    pub body: ErrorBody,
    pub headers: HeaderMap,
}

impl ErrorReply {
    fn general(status: StatusCode, message: Option<String>) -> Self {
        Self {
            status,
            body: ErrorBody::General(GeneralError::new(status.as_u16(), message)),
            headers: HeaderMap::new(),
        }
    }

    fn validation(errors: Vec<ValidationError>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            body: ErrorBody::Validation(errors),
            headers: HeaderMap::new(),
        }
    }

    fn field(path: String, value: Value, constraint: &str) -> Self {
        Self::validation(vec![ValidationError::new(path, value, constraint)])
    }

    fn field_with(
        path: String,
        value: Value,
        constraint: &str,
        param: (&'static str, Value),
    ) -> Self {
        Self::validation(vec![ValidationError::with_params(
            path,
            value,
            constraint,
            [param],
        )])
    }
}

impl IntoResponse for ErrorReply {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.body)).into_response();
        response.headers_mut().extend(self.headers);
        response
    }
}

/// Classify `failure` and build the reply for it.
pub fn normalize(failure: Option<&(dyn Error + 'static)>) -> ErrorReply {
    let Some(mut current) = failure else {
        return unhandled(None);
    };
    for _ in 0..MAX_CAUSE_DEPTH {
        if let Some((category, reply)) = classify(current) {
            metrics::counter!("backstage_errors_total", "category" => category).increment(1);
            return reply;
        }
        // A newtype variant shares its payload's address, so compare the
        // vtable too before calling a hop a cycle.
        match current.source() {
            Some(next) if !std::ptr::eq(next as *const dyn Error, current as *const dyn Error) => {
                current = next
            }
            _ => break,
        }
    }
    unhandled(Some(current))
}

fn unhandled(deepest: Option<&(dyn Error + 'static)>) -> ErrorReply {
    metrics::counter!("backstage_errors_total", "category" => "unhandled").increment(1);
    let message = match deepest {
        Some(err) => err.to_string(),
        None => UNKNOWN_ERROR_MESSAGE.to_string(),
    };
    tracing::error!(error = %message, "unhandled request failure");
    ErrorReply::general(StatusCode::INTERNAL_SERVER_ERROR, Some(message))
}

fn classify(err: &(dyn Error + 'static)) -> Option<(&'static str, ErrorReply)> {
    if let Some(err) = err.downcast_ref::<InvalidArgument>() {
        return Some(("invalid_argument", invalid_argument(&err.message)));
    }
    if let Some(BindingError::Malformed { message }) = err.downcast_ref::<BindingError>() {
        return Some(("invalid_argument", invalid_argument(message)));
    }
    if let Some(StoreError::NotFound(message)) = err.downcast_ref::<StoreError>() {
        return Some((
            "not_found",
            ErrorReply::general(StatusCode::NOT_FOUND, Some(message.clone())),
        ));
    }
    if let Some(BindingError::MissingField { path }) = err.downcast_ref::<BindingError>() {
        return Some((
            "missing_field",
            ErrorReply::field(build_path(path), Value::Null, codes::NOT_MISSING),
        ));
    }
    if let Some(err) = err.downcast_ref::<HttpError>() {
        tracing::error!(error = %err.message, status = %err.status, "request failed");
        return Some((
            "http",
            ErrorReply::general(err.status, Some(err.message.clone())),
        ));
    }
    if let Some(BindingError::InvalidFormat {
        path,
        value,
        target,
        cause,
    }) = err.downcast_ref::<BindingError>()
    {
        return Some(("invalid_format", invalid_format(build_path(path), value, target, cause)));
    }
    if let Some(BindingError::UnknownTypeTag { path, type_id }) = err.downcast_ref::<BindingError>()
    {
        return Some((
            "invalid_type_id",
            ErrorReply::field(
                build_path(path),
                Value::String(type_id.clone()),
                codes::INVALID_JSON_TYPE,
            ),
        ));
    }
    if let Some(BindingError::TypeMismatch {
        path,
        expected_type,
    }) = err.downcast_ref::<BindingError>()
    {
        return Some((
            "incorrect_type",
            ErrorReply::field_with(
                build_path(path),
                Value::Null,
                codes::INCORRECT_TYPE,
                (codes::PARAM_EXPECTED_TYPE, json!(expected_type)),
            ),
        ));
    }
    if let Some(message) = constraint_message(err) {
        tracing::warn!(error = %message, "storage constraint violated");
        return Some((
            "constraint",
            ErrorReply::general(StatusCode::UNPROCESSABLE_ENTITY, Some(message)),
        ));
    }
    if err.downcast_ref::<NotImplemented>().is_some() {
        return Some((
            "not_implemented",
            ErrorReply::general(
                StatusCode::NOT_IMPLEMENTED,
                Some(NOT_IMPLEMENTED_MESSAGE.to_string()),
            ),
        ));
    }
    if let Some(err) = err.downcast_ref::<MethodNotAllowed>() {
        let mut headers = HeaderMap::new();
        if let Some(allow) = &err.allow {
            headers.insert(ALLOW, allow.clone());
        }
        return Some((
            "method_not_allowed",
            ErrorReply {
                status: StatusCode::METHOD_NOT_ALLOWED,
                body: ErrorBody::General(err.body.clone()),
                headers,
            },
        ));
    }
    if let Some(ConstraintViolations(errors)) = err.downcast_ref::<ConstraintViolations>() {
        return Some(("validation", ErrorReply::validation(errors.clone())));
    }
    if err.downcast_ref::<Unauthorized>().is_some() {
        return Some((
            "unauthorized",
            ErrorReply::general(StatusCode::FORBIDDEN, Some(ACCESS_DENIED_MESSAGE.to_string())),
        ));
    }
    None
}

fn invalid_argument(message: &str) -> ErrorReply {
    tracing::error!(error = %message, "invalid argument");
    ErrorReply::general(StatusCode::BAD_REQUEST, Some(message.to_string()))
}

fn invalid_format(
    path: String,
    value: &Value,
    target: &FormatTarget,
    cause: &Option<super::DateTimeParseError>,
) -> ErrorReply {
    if let Some(cause) = cause {
        return ErrorReply::field(
            path,
            Value::String(cause.parsed.clone()),
            codes::INVALID_DATETIME_FORMAT,
        );
    }
    match target {
        FormatTarget::Enum { allowed } => ErrorReply::field_with(
            path,
            value.clone(),
            codes::INVALID_ENUM_VALUE,
            (codes::PARAM_ALLOWED_VALUE, json!(allowed)),
        ),
        FormatTarget::Scalar => ErrorReply::field(path, value.clone(), codes::INVALID_FORMAT),
    }
}

/// Message of a storage-level constraint violation, typed or raw.
fn constraint_message(err: &(dyn Error + 'static)) -> Option<String> {
    if let Some(StoreError::Constraint(message)) = err.downcast_ref::<StoreError>() {
        return Some(message.clone());
    }
    if let Some(sqlx::Error::Database(db_err)) = err.downcast_ref::<sqlx::Error>() {
        // SQLSTATE class 23: integrity constraint violation.
        if db_err.code().is_some_and(|code| code.starts_with("23")) {
            return Some(db_err.message().to_string());
        }
    }
    None
}
