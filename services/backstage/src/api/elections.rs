//! Election API handlers.
//!
//! # Purpose
//! Members read elections; only the committee schedules, edits and removes
//! them. Positions are created together with the election.
use crate::api::extract::{bind_json, path_param, principal_from_headers};
use crate::api::types::{CreateElection, UpdateElection};
use crate::api::{created, no_content};
use crate::app::AppState;
use crate::auth::ElectionPolicy;
use crate::error::{AppResult, NotImplemented};
use crate::model::{Election, NewElection};
use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Response;
use backstage_authz::{CrudAction, Policy};

#[utoipa::path(
    get,
    path = "/election",
    tag = "elections",
    responses(
        (status = 200, description = "All elections", body = [Election]),
        (status = 403, description = "Caller is not a member", body = crate::error::GeneralError)
    )
)]
pub(crate) async fn list_elections(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<Vec<Election>>> {
    let principal = principal_from_headers(&state, &headers)?;
    ElectionPolicy::new(&principal).authorize(CrudAction::List, None)?;
    Ok(Json(state.store.list_elections().await?))
}

#[utoipa::path(
    post,
    path = "/election",
    tag = "elections",
    request_body = CreateElection,
    responses(
        (status = 201, description = "Election created; see Location and resource-id"),
        (status = 403, description = "Caller is not an admin", body = crate::error::GeneralError),
        (status = 422, description = "Invalid election", body = [crate::error::ValidationError])
    )
)]
pub(crate) async fn create_election(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Response> {
    let request: CreateElection = bind_json(&body)?;
    let principal = principal_from_headers(&state, &headers)?;
    ElectionPolicy::new(&principal).authorize(CrudAction::Create, None)?;
    let (details, position_names) = request.into_parts();
    let election = state
        .store
        .create_election(NewElection {
            details,
            position_names,
        })
        .await?;
    tracing::info!(election_id = election.id, "election created");
    Ok(created(format!("/election/{}", election.id), election.id))
}

#[utoipa::path(
    get,
    path = "/election/{id}",
    tag = "elections",
    params(("id" = i64, Path, description = "Election identifier")),
    responses(
        (status = 200, description = "The election with its positions", body = Election),
        (status = 404, description = "Unknown election", body = crate::error::GeneralError)
    )
)]
pub(crate) async fn get_election(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<Election>> {
    let id = path_param(id)?;
    let principal = principal_from_headers(&state, &headers)?;
    ElectionPolicy::new(&principal).authorize(CrudAction::View, None)?;
    Ok(Json(state.store.get_election(id).await?))
}

#[utoipa::path(
    put,
    path = "/election/{id}",
    tag = "elections",
    params(("id" = i64, Path, description = "Election identifier")),
    request_body = UpdateElection,
    responses(
        (status = 204, description = "Election replaced"),
        (status = 404, description = "Unknown election", body = crate::error::GeneralError)
    )
)]
pub(crate) async fn update_election(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<Path<i64>, PathRejection>,
    body: Bytes,
) -> AppResult<Response> {
    let id = path_param(id)?;
    let request: UpdateElection = bind_json(&body)?;
    let principal = principal_from_headers(&state, &headers)?;
    ElectionPolicy::new(&principal).authorize(CrudAction::Update, None)?;
    state.store.update_election(id, request.into_details()).await?;
    Ok(no_content(id))
}

#[utoipa::path(
    delete,
    path = "/election/{id}",
    tag = "elections",
    params(("id" = i64, Path, description = "Election identifier")),
    responses(
        (status = 204, description = "Election and its positions removed"),
        (status = 404, description = "Unknown election", body = crate::error::GeneralError),
        (status = 422, description = "Election still has nominations", body = crate::error::GeneralError)
    )
)]
pub(crate) async fn delete_election(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<Path<i64>, PathRejection>,
) -> AppResult<Response> {
    let id = path_param(id)?;
    let principal = principal_from_headers(&state, &headers)?;
    ElectionPolicy::new(&principal).authorize(CrudAction::Delete, None)?;
    state.store.delete_election(id).await?;
    tracing::info!(election_id = id, "election deleted");
    Ok(no_content(id))
}

#[utoipa::path(
    get,
    path = "/election/{id}/results",
    tag = "elections",
    params(("id" = i64, Path, description = "Election identifier")),
    responses(
        (status = 501, description = "Results are not published through the API yet", body = crate::error::GeneralError)
    )
)]
pub(crate) async fn election_results(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<Election>> {
    let id = path_param(id)?;
    let principal = principal_from_headers(&state, &headers)?;
    ElectionPolicy::new(&principal).authorize(CrudAction::View, None)?;
    state.store.get_election(id).await?;
    Err(NotImplemented.into())
}
