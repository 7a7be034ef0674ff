//! Menu API handlers.
use crate::api::extract::principal_from_headers;
use crate::app::AppState;
use crate::auth::{MenuAction, MenuPolicy};
use crate::error::AppResult;
use crate::model::{AdminMenuItem, MainMenuItem, admin_menu, main_menu};
use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use backstage_authz::Policy;

#[utoipa::path(
    get,
    path = "/menu/main",
    tag = "menu",
    responses((status = 200, description = "Main navigation tree", body = [MainMenuItem]))
)]
pub(crate) async fn main_menu_items(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<Vec<MainMenuItem>>> {
    let principal = principal_from_headers(&state, &headers)?;
    MenuPolicy::new(&principal).authorize(MenuAction::Main, None)?;
    Ok(Json(main_menu()))
}

#[utoipa::path(
    get,
    path = "/menu/admin",
    tag = "menu",
    responses(
        (status = 200, description = "Admin navigation tree", body = [AdminMenuItem]),
        (status = 403, description = "Caller is not an admin", body = crate::error::GeneralError)
    )
)]
pub(crate) async fn admin_menu_items(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<Vec<AdminMenuItem>>> {
    let principal = principal_from_headers(&state, &headers)?;
    MenuPolicy::new(&principal).authorize(MenuAction::Admin, None)?;
    Ok(Json(admin_menu()))
}
