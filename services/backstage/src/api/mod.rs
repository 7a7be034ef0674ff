//! Backstage HTTP API.
//!
//! # Purpose
//! Route handler modules plus the response conventions they share: writes
//! answer with an empty body and identify the touched record through the
//! `resource-id` header, creations of addressable records add `Location`.
pub mod awards;
pub mod elections;
pub mod extract;
pub mod menu;
pub mod nominations;
pub mod openapi;
pub mod positions;
pub mod system;
pub mod types;

use axum::http::header::LOCATION;
use axum::http::{HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use std::fmt::Display;

pub const RESOURCE_ID: HeaderName = HeaderName::from_static("resource-id");

pub(crate) fn no_content(id: impl Display) -> Response {
    (StatusCode::NO_CONTENT, [(RESOURCE_ID, id.to_string())]).into_response()
}

pub(crate) fn created(location: String, id: impl Display) -> Response {
    (
        StatusCode::CREATED,
        [(LOCATION, location), (RESOURCE_ID, id.to_string())],
    )
        .into_response()
}
