//! Backstage access-control primitives shared by the HTTP service and its tests.
//!
//! # Purpose
//! Models the request principal, the closed role set and the per-entity
//! [`Policy`] strategy that layers ownership checks on top of role checks.
//!
//! # How it fits
//! The service resolves a [`Principal`] once per request, fetches the target
//! entity from storage and asks the domain policy whether the action may
//! proceed. Policies never touch storage.
//!
//! # Key invariants
//! - Admin roles (`ROLE_COMMITTEE`, `ROLE_SUPER_ADMIN`) bypass every domain
//!   predicate, and the bypass is evaluated first.
//! - A missing entity never satisfies an entity predicate for a non-admin.
//! - Denials carry no reason.
//!
//! # Examples
//! ```rust
//! use backstage_authz::{CrudAction, Policy, Principal, Role, AuthzResult};
//!
//! struct NotePolicy<'a> {
//!     principal: &'a Principal,
//! }
//!
//! impl Policy<String> for NotePolicy<'_> {
//!     type Action = CrudAction;
//!
//!     fn principal(&self) -> &Principal {
//!         self.principal
//!     }
//!
//!     fn authorize(&self, action: CrudAction, entity: Option<&String>) -> AuthzResult<()> {
//!         match action {
//!             CrudAction::List | CrudAction::View => self.require(Principal::is_member),
//!             _ => self.require_entity(entity, |p, note| p.subject() == Some(note.as_str())),
//!         }
//!     }
//! }
//!
//! let member = Principal::new("u-1", [Role::Member.as_str()]);
//! let policy = NotePolicy { principal: &member };
//! assert!(policy.authorize(CrudAction::View, None).is_ok());
//! assert!(policy.authorize(CrudAction::Delete, None).is_err());
//! ```

mod action;
mod errors;
mod ownership;
mod policy;
mod principal;

pub use action::CrudAction;
pub use errors::{AuthzResult, Unauthorized};
pub use ownership::{HasAuthor, is_author, is_author_of};
pub use policy::Policy;
pub use principal::{Principal, Role};
