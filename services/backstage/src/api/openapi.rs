//! OpenAPI document for the backstage API.
use crate::api::types::{
    AwardRequest, CreateElection, CreateNomination, HealthCheck, HealthReport, PositionRequest,
    UpdateElection,
};
use crate::api::{awards, elections, menu, nominations, positions, system};
use crate::error::{Constraint, GeneralError, ValidationError};
use crate::model::{
    AdminMenuItem, Award, AwardRevision, DateTimeBand, Election, ElectionType, MainMenuItem,
    MenuLink, Nomination, Position, RevisionKind,
};
use axum::Json;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "backstage",
        version = "v1",
        description = "Membership back office HTTP API"
    ),
    paths(
        system::liveness,
        system::readiness,
        menu::main_menu_items,
        menu::admin_menu_items,
        awards::list_awards,
        awards::create_award,
        awards::get_award,
        awards::update_award,
        awards::approve_award,
        awards::unapprove_award,
        awards::delete_award,
        awards::award_revisions,
        elections::list_elections,
        elections::create_election,
        elections::get_election,
        elections::update_election,
        elections::delete_election,
        elections::election_results,
        positions::create_position,
        positions::update_position,
        positions::delete_position,
        nominations::list_nominations,
        nominations::create_nomination,
        nominations::withdraw_nomination
    ),
    components(schemas(
        GeneralError,
        ValidationError,
        Constraint,
        HealthCheck,
        HealthReport,
        MenuLink,
        MainMenuItem,
        AdminMenuItem,
        Award,
        AwardRevision,
        RevisionKind,
        AwardRequest,
        ElectionType,
        DateTimeBand,
        Position,
        Election,
        Nomination,
        CreateElection,
        UpdateElection,
        PositionRequest,
        CreateNomination
    )),
    tags(
        (name = "health", description = "Liveness and readiness"),
        (name = "menu", description = "Navigation menus"),
        (name = "awards", description = "Award proposals and moderation"),
        (name = "elections", description = "Committee elections"),
        (name = "positions", description = "Positions contested in an election"),
        (name = "nominations", description = "Candidates standing for positions")
    )
)]
pub struct ApiDoc;

pub(crate) async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
