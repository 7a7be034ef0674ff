//! Navigation menus served to the front end.
//!
//! # Purpose
//! Builds the fixed main and admin menu trees. Item ids are generated per
//! build so clients can key list rendering on them.
use crate::validation::{ConstraintViolations, Validate, Validator};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Target of a menu entry: a client-side route alias or a plain URL.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct MenuLink {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl MenuLink {
    pub fn alias(alias: &str) -> Self {
        Self {
            href: None,
            alias: Some(alias.to_string()),
        }
    }
}

impl Validate for MenuLink {
    fn validate(&self) -> Result<(), ConstraintViolations> {
        let mut validator = Validator::new();
        if self.alias.is_none() {
            validator.not_null("href", self.href.as_ref());
        }
        validator.finish()
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct MainMenuItem {
    pub id: Uuid,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<MenuLink>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(no_recursion)]
    pub children: Option<Vec<MainMenuItem>>,
}

impl MainMenuItem {
    fn link(text: &str, alias: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.to_string(),
            link: Some(MenuLink::alias(alias)),
            children: None,
        }
    }

    fn group(text: &str, children: Vec<MainMenuItem>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.to_string(),
            link: None,
            children: Some(children),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct AdminMenuItem {
    pub id: Uuid,
    pub icon: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<MenuLink>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(no_recursion)]
    pub items: Option<Vec<AdminMenuItem>>,
}

impl AdminMenuItem {
    fn link(icon: &str, text: &str, alias: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            icon: icon.to_string(),
            text: text.to_string(),
            link: Some(MenuLink::alias(alias)),
            items: None,
        }
    }

    fn group(icon: &str, text: &str, items: Vec<AdminMenuItem>) -> Self {
        Self {
            id: Uuid::new_v4(),
            icon: icon.to_string(),
            text: text.to_string(),
            link: None,
            items: Some(items),
        }
    }
}

pub fn main_menu() -> Vec<MainMenuItem> {
    vec![
        MainMenuItem::link("Events", "events.diary"),
        MainMenuItem::link("Members", "members.dashboard"),
        MainMenuItem::group(
            "Equipment",
            vec![
                MainMenuItem::link("Asset database", "equipment.assets"),
                MainMenuItem::link("Repairs database", "equipment.repairs"),
            ],
        ),
        MainMenuItem::group(
            "Training",
            vec![
                MainMenuItem::link("Skills", "training.skills"),
                MainMenuItem::link("Skill applications", "training.skill.applications"),
                MainMenuItem::link("Skill categories", "training.skill.categories"),
            ],
        ),
        MainMenuItem::group(
            "Safety",
            vec![
                MainMenuItem::link("Report incident", "report.incident"),
                MainMenuItem::link("Report near miss", "report.nearmiss"),
            ],
        ),
        MainMenuItem::link("Resources", "resources.search"),
    ]
}

pub fn admin_menu() -> Vec<AdminMenuItem> {
    vec![
        AdminMenuItem::link("cogs", "Dashboard", "admin.dashboard"),
        AdminMenuItem::group(
            "users",
            "Users",
            vec![
                AdminMenuItem::link("users", "View users", "admin.users"),
                AdminMenuItem::link("user-plus", "Add users", "admin.users.add"),
                AdminMenuItem::link("user-friends", "Manage groups", "admin.groups"),
                AdminMenuItem::link("users-crown", "The committee", "admin.committee"),
            ],
        ),
    ]
}
