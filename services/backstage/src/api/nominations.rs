//! Nomination API handlers.
//!
//! # Purpose
//! Members nominate themselves for a position of an election and may withdraw
//! their own nomination; admins may withdraw anyone's.
use crate::api::extract::{acting_subject, bind_json, path_param, principal_from_headers};
use crate::api::types::CreateNomination;
use crate::api::{created, no_content};
use crate::app::AppState;
use crate::auth::{NominationAction, NominationPolicy};
use crate::error::AppResult;
use crate::model::Nomination;
use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Response;
use backstage_authz::Policy;

#[utoipa::path(
    get,
    path = "/election/{election_id}/nomination",
    tag = "nominations",
    params(("election_id" = i64, Path, description = "Election identifier")),
    responses(
        (status = 200, description = "Nominations of the election", body = [Nomination]),
        (status = 404, description = "Unknown election", body = crate::error::GeneralError)
    )
)]
pub(crate) async fn list_nominations(
    State(state): State<AppState>,
    headers: HeaderMap,
    election_id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<Vec<Nomination>>> {
    let election_id = path_param(election_id)?;
    let principal = principal_from_headers(&state, &headers)?;
    NominationPolicy::new(&principal).authorize(NominationAction::List, None)?;
    Ok(Json(state.store.list_nominations(election_id).await?))
}

#[utoipa::path(
    post,
    path = "/election/{election_id}/nomination",
    tag = "nominations",
    params(("election_id" = i64, Path, description = "Election identifier")),
    request_body = CreateNomination,
    responses(
        (status = 201, description = "Caller nominated; see Location and resource-id"),
        (status = 404, description = "Unknown election or position", body = crate::error::GeneralError),
        (status = 422, description = "Already nominated for the position", body = crate::error::GeneralError)
    )
)]
pub(crate) async fn create_nomination(
    State(state): State<AppState>,
    headers: HeaderMap,
    election_id: Result<Path<i64>, PathRejection>,
    body: Bytes,
) -> AppResult<Response> {
    let election_id = path_param(election_id)?;
    let request: CreateNomination = bind_json(&body)?;
    let principal = principal_from_headers(&state, &headers)?;
    NominationPolicy::new(&principal).authorize(NominationAction::Nominate, None)?;
    let subject = acting_subject(&principal)?;
    let nomination = state
        .store
        .create_nomination(election_id, request.position_id, subject)
        .await?;
    Ok(created(
        format!("/election/{election_id}/nomination/{}", nomination.id),
        nomination.id,
    ))
}

#[utoipa::path(
    delete,
    path = "/election/{election_id}/nomination/{nomination_id}",
    tag = "nominations",
    params(
        ("election_id" = i64, Path, description = "Election identifier"),
        ("nomination_id" = i64, Path, description = "Nomination identifier")
    ),
    responses(
        (status = 204, description = "Nomination withdrawn"),
        (status = 403, description = "Caller is neither the nominee nor an admin", body = crate::error::GeneralError),
        (status = 404, description = "Unknown election or nomination", body = crate::error::GeneralError)
    )
)]
pub(crate) async fn withdraw_nomination(
    State(state): State<AppState>,
    headers: HeaderMap,
    ids: Result<Path<(i64, i64)>, PathRejection>,
) -> AppResult<Response> {
    let (election_id, nomination_id) = path_param(ids)?;
    let principal = principal_from_headers(&state, &headers)?;
    let nomination = state
        .store
        .get_nomination(election_id, nomination_id)
        .await?;
    NominationPolicy::new(&principal).authorize(NominationAction::Withdraw, Some(&nomination))?;
    state
        .store
        .delete_nomination(election_id, nomination_id)
        .await?;
    Ok(no_content(nomination_id))
}
