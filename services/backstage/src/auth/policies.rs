//! Access rules for each backstage resource.
//!
//! Every policy borrows the request's principal and maps its verbs onto the
//! primitives from [`backstage_authz::Policy`]. Admins (committee and super
//! admin) are let through by those primitives before any rule here runs.
use crate::model::{Award, Election, Nomination};
use backstage_authz::{AuthzResult, CrudAction, Policy, Principal, is_author, is_author_of};

/// Predicate nobody but an admin satisfies.
fn admin_only(_: &Principal) -> bool {
    false
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AwardAction {
    List,
    Create,
    View,
    Update,
    Approve,
    Delete,
    ViewHistory,
}

pub struct AwardPolicy<'a> {
    principal: &'a Principal,
}

impl<'a> AwardPolicy<'a> {
    pub fn new(principal: &'a Principal) -> Self {
        Self { principal }
    }
}

impl Policy<Award> for AwardPolicy<'_> {
    type Action = AwardAction;

    fn principal(&self) -> &Principal {
        self.principal
    }

    fn authorize(&self, action: AwardAction, award: Option<&Award>) -> AuthzResult<()> {
        match action {
            AwardAction::List | AwardAction::Create | AwardAction::View => {
                self.require(Principal::is_member)
            }
            AwardAction::Update => {
                self.require_entity(award, |principal, award| {
                    is_author_of(principal, Some(award))
                })
            }
            AwardAction::Approve | AwardAction::Delete | AwardAction::ViewHistory => {
                self.require(admin_only)
            }
        }
    }
}

pub struct ElectionPolicy<'a> {
    principal: &'a Principal,
}

impl<'a> ElectionPolicy<'a> {
    pub fn new(principal: &'a Principal) -> Self {
        Self { principal }
    }
}

/// Positions are managed through their election, so they share this policy.
impl Policy<Election> for ElectionPolicy<'_> {
    type Action = CrudAction;

    fn principal(&self) -> &Principal {
        self.principal
    }

    fn authorize(&self, action: CrudAction, _: Option<&Election>) -> AuthzResult<()> {
        match action {
            CrudAction::List | CrudAction::View => self.require(Principal::is_member),
            CrudAction::Create | CrudAction::Update | CrudAction::Delete => {
                self.require(admin_only)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NominationAction {
    List,
    Nominate,
    Withdraw,
}

pub struct NominationPolicy<'a> {
    principal: &'a Principal,
}

impl<'a> NominationPolicy<'a> {
    pub fn new(principal: &'a Principal) -> Self {
        Self { principal }
    }
}

impl Policy<Nomination> for NominationPolicy<'_> {
    type Action = NominationAction;

    fn principal(&self) -> &Principal {
        self.principal
    }

    fn authorize(&self, action: NominationAction, nomination: Option<&Nomination>) -> AuthzResult<()> {
        match action {
            NominationAction::List | NominationAction::Nominate => {
                self.require(Principal::is_member)
            }
            NominationAction::Withdraw => self.require_entity(nomination, |principal, nomination| {
                is_author(principal, Some(nomination), |n| n.user_id.clone())
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Main,
    Admin,
}

/// Menus are fixed trees, so decisions never look at an entity.
pub struct MenuPolicy<'a> {
    principal: &'a Principal,
}

impl<'a> MenuPolicy<'a> {
    pub fn new(principal: &'a Principal) -> Self {
        Self { principal }
    }
}

impl Policy<()> for MenuPolicy<'_> {
    type Action = MenuAction;

    fn principal(&self) -> &Principal {
        self.principal
    }

    fn authorize(&self, action: MenuAction, _: Option<&()>) -> AuthzResult<()> {
        match action {
            MenuAction::Main => self.allow(),
            MenuAction::Admin => self.require(admin_only),
        }
    }
}
