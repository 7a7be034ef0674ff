//! Failures raised while serving a request.
//!
//! # Purpose
//! Each failure category is its own type so the normalizer can classify a
//! cause chain by type. Handlers return [`AppError`], which wraps one of them
//! as its source and renders itself through [`normalize`].
use crate::store::StoreError;
use crate::validation::ConstraintViolations;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use backstage_authz::Unauthorized;
use thiserror::Error;

mod binding;
pub mod codes;
mod dto;
mod normalizer;

pub use binding::{BindingError, DateTimeParseError, FormatTarget, PathSegment, build_path};
pub use dto::{Constraint, GeneralError, ValidationError};
pub use normalizer::{
    ErrorBody, ErrorReply, NOT_IMPLEMENTED_MESSAGE, UNKNOWN_ERROR_MESSAGE, normalize,
};

/// A caller-supplied argument failed a basic precondition.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct InvalidArgument {
    pub message: String,
}

impl InvalidArgument {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// An operation failure that already knows its status.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HttpError {
    pub status: StatusCode,
    pub message: String,
}

impl HttpError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
#[error("not implemented")]
pub struct NotImplemented;

/// Transport-level method mismatch with its pre-built response parts.
#[derive(Debug, Error)]
#[error("method not allowed")]
pub struct MethodNotAllowed {
    pub allow: Option<HeaderValue>,
    pub body: GeneralError,
}

impl MethodNotAllowed {
    pub fn new(allow: Option<HeaderValue>) -> Self {
        Self {
            allow,
            body: GeneralError::new(
                StatusCode::METHOD_NOT_ALLOWED.as_u16(),
                Some("Method not allowed".to_string()),
            ),
        }
    }
}

/// Error type returned by every handler.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidArgument(#[from] InvalidArgument),
    #[error("{0}")]
    Binding(#[from] BindingError),
    #[error("{0}")]
    Http(#[from] HttpError),
    #[error("{0}")]
    Store(#[from] StoreError),
    #[error("{0}")]
    Validation(#[from] ConstraintViolations),
    #[error("{0}")]
    NotImplemented(#[from] NotImplemented),
    #[error("{0}")]
    MethodNotAllowed(#[from] MethodNotAllowed),
    #[error("{0}")]
    Unauthorized(#[from] Unauthorized),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        normalize(Some(&self)).into_response()
    }
}
