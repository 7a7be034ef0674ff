//! Award API handlers.
//!
//! # Purpose
//! Members propose awards and edit their own proposals; the committee approves,
//! removes and audits them. Every write is recorded with the acting subject.
use crate::api::extract::{acting_subject, bind_json, path_param, principal_from_headers};
use crate::api::no_content;
use crate::api::types::AwardRequest;
use crate::app::AppState;
use crate::auth::{AwardAction, AwardPolicy};
use crate::error::AppResult;
use crate::model::{Award, AwardRevision};
use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Response;
use backstage_authz::Policy;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/award",
    tag = "awards",
    responses(
        (status = 200, description = "All awards", body = [Award]),
        (status = 403, description = "Caller is not a member", body = crate::error::GeneralError)
    )
)]
pub(crate) async fn list_awards(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<Vec<Award>>> {
    let principal = principal_from_headers(&state, &headers)?;
    AwardPolicy::new(&principal).authorize(AwardAction::List, None)?;
    Ok(Json(state.store.list_awards().await?))
}

#[utoipa::path(
    post,
    path = "/award",
    tag = "awards",
    request_body = AwardRequest,
    responses(
        (status = 204, description = "Award proposed; id in the resource-id header"),
        (status = 400, description = "Malformed body", body = crate::error::GeneralError),
        (status = 422, description = "Invalid award", body = [crate::error::ValidationError])
    )
)]
pub(crate) async fn create_award(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Response> {
    let request: AwardRequest = bind_json(&body)?;
    let principal = principal_from_headers(&state, &headers)?;
    AwardPolicy::new(&principal).authorize(AwardAction::Create, None)?;
    let subject = acting_subject(&principal)?;
    let award = Award {
        id: Uuid::new_v4(),
        name: request.name,
        description: request.description,
        recurring: request.recurring,
        suggested_by: subject.to_string(),
        approved: false,
    };
    let created = state.store.create_award(award, subject).await?;
    tracing::info!(award_id = %created.id, "award proposed");
    Ok(no_content(created.id))
}

#[utoipa::path(
    get,
    path = "/award/{id}",
    tag = "awards",
    params(("id" = Uuid, Path, description = "Award identifier")),
    responses(
        (status = 200, description = "The award", body = Award),
        (status = 404, description = "Unknown award", body = crate::error::GeneralError)
    )
)]
pub(crate) async fn get_award(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<Award>> {
    let id = path_param(id)?;
    let principal = principal_from_headers(&state, &headers)?;
    AwardPolicy::new(&principal).authorize(AwardAction::View, None)?;
    Ok(Json(state.store.get_award(id).await?))
}

#[utoipa::path(
    patch,
    path = "/award/{id}",
    tag = "awards",
    params(("id" = Uuid, Path, description = "Award identifier")),
    request_body = AwardRequest,
    responses(
        (status = 204, description = "Award replaced"),
        (status = 403, description = "Caller is neither the proposer nor an admin", body = crate::error::GeneralError),
        (status = 404, description = "Unknown award", body = crate::error::GeneralError)
    )
)]
pub(crate) async fn update_award(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<Path<Uuid>, PathRejection>,
    body: Bytes,
) -> AppResult<Response> {
    let id = path_param(id)?;
    let request: AwardRequest = bind_json(&body)?;
    let principal = principal_from_headers(&state, &headers)?;
    let existing = state.store.get_award(id).await?;
    AwardPolicy::new(&principal).authorize(AwardAction::Update, Some(&existing))?;
    let subject = acting_subject(&principal)?;
    let award = Award {
        name: request.name,
        description: request.description,
        recurring: request.recurring,
        ..existing
    };
    state.store.update_award(award, subject).await?;
    Ok(no_content(id))
}

#[utoipa::path(
    patch,
    path = "/award/{id}/approve",
    tag = "awards",
    params(("id" = Uuid, Path, description = "Award identifier")),
    responses(
        (status = 204, description = "Award approved"),
        (status = 403, description = "Caller is not an admin", body = crate::error::GeneralError)
    )
)]
pub(crate) async fn approve_award(
    state: State<AppState>,
    headers: HeaderMap,
    id: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Response> {
    set_approval(state, headers, id, true).await
}

#[utoipa::path(
    patch,
    path = "/award/{id}/unapprove",
    tag = "awards",
    params(("id" = Uuid, Path, description = "Award identifier")),
    responses(
        (status = 204, description = "Approval withdrawn"),
        (status = 403, description = "Caller is not an admin", body = crate::error::GeneralError)
    )
)]
pub(crate) async fn unapprove_award(
    state: State<AppState>,
    headers: HeaderMap,
    id: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Response> {
    set_approval(state, headers, id, false).await
}

async fn set_approval(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<Path<Uuid>, PathRejection>,
    approved: bool,
) -> AppResult<Response> {
    let id = path_param(id)?;
    let principal = principal_from_headers(&state, &headers)?;
    AwardPolicy::new(&principal).authorize(AwardAction::Approve, None)?;
    let subject = acting_subject(&principal)?;
    let existing = state.store.get_award(id).await?;
    let award = Award {
        approved,
        ..existing
    };
    state.store.update_award(award, subject).await?;
    tracing::info!(award_id = %id, approved, "award approval changed");
    Ok(no_content(id))
}

#[utoipa::path(
    delete,
    path = "/award/{id}",
    tag = "awards",
    params(("id" = Uuid, Path, description = "Award identifier")),
    responses(
        (status = 204, description = "Award removed"),
        (status = 403, description = "Caller is not an admin", body = crate::error::GeneralError),
        (status = 404, description = "Unknown award", body = crate::error::GeneralError)
    )
)]
pub(crate) async fn delete_award(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Response> {
    let id = path_param(id)?;
    let principal = principal_from_headers(&state, &headers)?;
    let subject = principal.subject().unwrap_or_default();
    let removal = AwardPolicy::new(&principal).authorize_and_run(AwardAction::Delete, None, || {
        state.store.delete_award(id, subject)
    })?;
    removal.await?;
    Ok(no_content(id))
}

#[utoipa::path(
    get,
    path = "/award/{id}/revisions",
    tag = "awards",
    params(("id" = Uuid, Path, description = "Award identifier")),
    responses(
        (status = 200, description = "Audit trail, oldest first", body = [AwardRevision]),
        (status = 404, description = "Award never existed", body = crate::error::GeneralError)
    )
)]
pub(crate) async fn award_revisions(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<Vec<AwardRevision>>> {
    let id = path_param(id)?;
    let principal = principal_from_headers(&state, &headers)?;
    AwardPolicy::new(&principal).authorize(AwardAction::ViewHistory, None)?;
    Ok(Json(state.store.award_revisions(id).await?))
}
