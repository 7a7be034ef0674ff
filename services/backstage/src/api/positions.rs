//! Position API handlers.
//!
//! Positions belong to one election and are managed under the election's
//! policy: only admins add, rename or remove them.
use crate::api::extract::{bind_json, path_param, principal_from_headers};
use crate::api::types::PositionRequest;
use crate::api::{created, no_content};
use crate::app::AppState;
use crate::auth::ElectionPolicy;
use crate::error::AppResult;
use axum::body::Bytes;
use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Response;
use backstage_authz::{CrudAction, Policy};

#[utoipa::path(
    post,
    path = "/election/{election_id}/position",
    tag = "positions",
    params(("election_id" = i64, Path, description = "Election identifier")),
    request_body = PositionRequest,
    responses(
        (status = 201, description = "Position added; see Location and resource-id"),
        (status = 404, description = "Unknown election", body = crate::error::GeneralError)
    )
)]
pub(crate) async fn create_position(
    State(state): State<AppState>,
    headers: HeaderMap,
    election_id: Result<Path<i64>, PathRejection>,
    body: Bytes,
) -> AppResult<Response> {
    let election_id = path_param(election_id)?;
    let request: PositionRequest = bind_json(&body)?;
    let principal = principal_from_headers(&state, &headers)?;
    ElectionPolicy::new(&principal).authorize(CrudAction::Update, None)?;
    let position = state
        .store
        .create_position(election_id, &request.name)
        .await?;
    Ok(created(
        format!("/election/{election_id}/position/{}", position.id),
        position.id,
    ))
}

#[utoipa::path(
    put,
    path = "/election/{election_id}/position/{position_id}",
    tag = "positions",
    params(
        ("election_id" = i64, Path, description = "Election identifier"),
        ("position_id" = i64, Path, description = "Position identifier")
    ),
    request_body = PositionRequest,
    responses(
        (status = 204, description = "Position renamed"),
        (status = 404, description = "Unknown election or position", body = crate::error::GeneralError)
    )
)]
pub(crate) async fn update_position(
    State(state): State<AppState>,
    headers: HeaderMap,
    ids: Result<Path<(i64, i64)>, PathRejection>,
    body: Bytes,
) -> AppResult<Response> {
    let (election_id, position_id) = path_param(ids)?;
    let request: PositionRequest = bind_json(&body)?;
    let principal = principal_from_headers(&state, &headers)?;
    ElectionPolicy::new(&principal).authorize(CrudAction::Update, None)?;
    state
        .store
        .update_position(election_id, position_id, &request.name)
        .await?;
    Ok(no_content(position_id))
}

#[utoipa::path(
    delete,
    path = "/election/{election_id}/position/{position_id}",
    tag = "positions",
    params(
        ("election_id" = i64, Path, description = "Election identifier"),
        ("position_id" = i64, Path, description = "Position identifier")
    ),
    responses(
        (status = 204, description = "Position removed"),
        (status = 404, description = "Unknown election or position", body = crate::error::GeneralError),
        (status = 422, description = "Position still has nominations", body = crate::error::GeneralError)
    )
)]
pub(crate) async fn delete_position(
    State(state): State<AppState>,
    headers: HeaderMap,
    ids: Result<Path<(i64, i64)>, PathRejection>,
) -> AppResult<Response> {
    let (election_id, position_id) = path_param(ids)?;
    let principal = principal_from_headers(&state, &headers)?;
    ElectionPolicy::new(&principal).authorize(CrudAction::Delete, None)?;
    state.store.delete_position(election_id, position_id).await?;
    Ok(no_content(position_id))
}
