//! Backstage service library crate.
//!
//! # Purpose
//! Exposes the HTTP API, access policies, error normalization, configuration
//! and storage implementations for use by the binary and tests.
pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod model;
pub mod observability;
pub mod store;
pub mod time;
pub mod validation;
