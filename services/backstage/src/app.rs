//! Backstage HTTP application wiring.
//!
//! # Purpose
//! Builds the Axum router, configures middleware, and defines the shared
//! application state injected into handlers.
//!
//! # Notes
//! Transport failures produced by the router itself (unknown path, method not
//! routed for a known path) are rendered through the same normalizer as
//! handler failures so every error body has one shape.
use crate::api;
use crate::auth::TokenVerifier;
use crate::error::{AppError, HttpError, MethodNotAllowed};
use crate::observability;
use crate::store::Store;
use axum::Router;
use axum::http::header::ALLOW;
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_opentelemetry::OpenTelemetrySpanExt;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    /// Absent when no token secret is configured; every caller is then anonymous.
    pub tokens: Option<TokenVerifier>,
    pub profile: String,
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            let parent = observability::trace_context_from_headers(request.headers());
            let span = tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version()
            );
            span.set_parent(parent);
            span
        });

    Router::new()
        .route("/health/live", axum::routing::get(api::system::liveness))
        .route("/health/ready", axum::routing::get(api::system::readiness))
        .route("/openapi.json", axum::routing::get(api::openapi::openapi_json))
        .route(
            "/menu/main",
            axum::routing::get(api::menu::main_menu_items),
        )
        .route(
            "/menu/admin",
            axum::routing::get(api::menu::admin_menu_items),
        )
        .route(
            "/award",
            axum::routing::get(api::awards::list_awards).post(api::awards::create_award),
        )
        .route(
            "/award/:id",
            axum::routing::get(api::awards::get_award)
                .patch(api::awards::update_award)
                .delete(api::awards::delete_award),
        )
        .route(
            "/award/:id/approve",
            axum::routing::patch(api::awards::approve_award),
        )
        .route(
            "/award/:id/unapprove",
            axum::routing::patch(api::awards::unapprove_award),
        )
        .route(
            "/award/:id/revisions",
            axum::routing::get(api::awards::award_revisions),
        )
        .route(
            "/election",
            axum::routing::get(api::elections::list_elections)
                .post(api::elections::create_election),
        )
        .route(
            "/election/:id",
            axum::routing::get(api::elections::get_election)
                .put(api::elections::update_election)
                .delete(api::elections::delete_election),
        )
        .route(
            "/election/:id/results",
            axum::routing::get(api::elections::election_results),
        )
        .route(
            "/election/:election_id/position",
            axum::routing::post(api::positions::create_position),
        )
        .route(
            "/election/:election_id/position/:position_id",
            axum::routing::put(api::positions::update_position)
                .delete(api::positions::delete_position),
        )
        .route(
            "/election/:election_id/nomination",
            axum::routing::get(api::nominations::list_nominations)
                .post(api::nominations::create_nomination),
        )
        .route(
            "/election/:election_id/nomination/:nomination_id",
            axum::routing::delete(api::nominations::withdraw_nomination),
        )
        .fallback(route_not_found)
        .layer(axum::middleware::map_response(method_not_allowed_as_error))
        .layer(trace_layer)
        .with_state(state)
}

async fn route_not_found(method: Method, uri: Uri) -> AppError {
    HttpError::new(
        StatusCode::NOT_FOUND,
        format!("No handler found for {method} {}", uri.path()),
    )
    .into()
}

/// Re-render the router's bare 405 through the normalizer, keeping `Allow`.
async fn method_not_allowed_as_error(response: Response) -> Response {
    if response.status() != StatusCode::METHOD_NOT_ALLOWED {
        return response;
    }
    let allow = response.headers().get(ALLOW).cloned();
    AppError::from(MethodNotAllowed::new(allow)).into_response()
}
