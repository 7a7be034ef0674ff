#![allow(dead_code)]

use axum::body::Body;
use backstage::app::{AppState, build_router};
use backstage::auth::TokenVerifier;
use backstage::store::memory::InMemoryStore;
use std::sync::Arc;
use std::time::Duration;

pub const SECRET: &[u8] = b"integration-secret";

pub type App = axum::routing::RouterIntoService<Body, ()>;

pub fn app() -> App {
    let state = AppState {
        store: Arc::new(InMemoryStore::new()),
        tokens: Some(TokenVerifier::new(SECRET, None)),
        profile: "test".to_string(),
    };
    build_router(state).into_service()
}

pub fn token(subject: &str, groups: &[&str]) -> String {
    TokenVerifier::new(SECRET, None)
        .mint(subject, groups, Duration::from_secs(300))
        .expect("mint token")
}

pub fn member(subject: &str) -> String {
    token(subject, &["ROLE_MEMBER"])
}

pub fn committee() -> String {
    token("committee-1", &["ROLE_MEMBER", "ROLE_COMMITTEE"])
}

pub async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

pub fn header(response: &axum::response::Response, name: &str) -> String {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
