//! Request inputs shared by every handler.
//!
//! # Purpose
//! - Resolve the caller's [`Principal`] from the bearer token.
//! - Bind JSON bodies so failures keep the path of the offending field.
//! - Turn unparsable path parameters into invalid-argument failures.
//!
//! # Binding order
//! The body is parsed into a JSON value first so syntax errors are told apart
//! from value errors, then deserialized through `serde_path_to_error`, then
//! validated. The first stage to fail decides the response.
use crate::app::AppState;
use crate::error::{AppResult, BindingError, HttpError, InvalidArgument};
use crate::validation::Validate;
use axum::extract::Path;
use axum::extract::rejection::PathRejection;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use backstage_authz::{Principal, Unauthorized};
use serde::de::DeserializeOwned;
use serde_json::Value;

pub(crate) const INVALID_BEARER_TOKEN: &str = "invalid bearer token";

/// Principal for this request; anonymous without an `Authorization` header.
///
/// # Errors
/// - 401 when a header is present but does not carry a valid bearer token.
pub(crate) fn principal_from_headers(state: &AppState, headers: &HeaderMap) -> AppResult<Principal> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(Principal::anonymous());
    };
    let Some(verifier) = &state.tokens else {
        return Ok(Principal::anonymous());
    };
    let invalid = || HttpError::new(StatusCode::UNAUTHORIZED, INVALID_BEARER_TOKEN);
    let token = value
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(invalid)?;
    verifier.verify(token.trim()).map_err(|err| {
        tracing::debug!(error = %err, "rejected bearer token");
        invalid().into()
    })
}

/// Subject recorded as author or actor of a write.
pub(crate) fn acting_subject(principal: &Principal) -> AppResult<&str> {
    Ok(principal.subject().ok_or(Unauthorized)?)
}

pub(crate) fn bind_json<T>(body: &[u8]) -> AppResult<T>
where
    T: DeserializeOwned + Validate,
{
    let raw: Value = serde_json::from_slice(body).map_err(|err| BindingError::malformed(&err))?;
    let payload: T = serde_path_to_error::deserialize(&raw)
        .map_err(|err| BindingError::from_json(err, &raw))?;
    payload.validate()?;
    Ok(payload)
}

pub(crate) fn path_param<T>(param: Result<Path<T>, PathRejection>) -> AppResult<T> {
    match param {
        Ok(Path(value)) => Ok(value),
        Err(rejection) => Err(InvalidArgument::new(rejection.body_text()).into()),
    }
}
