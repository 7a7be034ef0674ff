//! Per-entity authorization strategy.
//!
//! # Purpose
//! [`Policy`] is implemented once per protected entity type. The implementor
//! maps each action to a decision built from [`Policy::allow`],
//! [`Policy::deny`], [`Policy::require`] and [`Policy::require_entity`]; the
//! admin bypass lives in the provided methods so no domain can forget it.
//!
//! # Notes
//! Decisions are pure: they read the principal and the already-fetched entity
//! and nothing else.
use crate::{AuthzResult, Principal, Unauthorized};
use std::fmt::Debug;

pub trait Policy<T> {
    /// Verbs this policy understands.
    type Action: Copy + Debug;

    fn principal(&self) -> &Principal;

    /// Decide whether the principal may perform `action` on `entity`.
    ///
    /// # Errors
    /// - [`Unauthorized`] when access is not granted.
    fn authorize(&self, action: Self::Action, entity: Option<&T>) -> AuthzResult<()>;

    /// Run `body` only after `authorize` succeeded.
    ///
    /// For async work return the future from `body` and await the result; a
    /// denial means the future is never created.
    fn authorize_and_run<R, F>(
        &self,
        action: Self::Action,
        entity: Option<&T>,
        body: F,
    ) -> AuthzResult<R>
    where
        F: FnOnce() -> R,
    {
        self.authorize(action, entity)?;
        Ok(body())
    }

    fn allow(&self) -> AuthzResult<()> {
        Ok(())
    }

    fn deny(&self) -> AuthzResult<()> {
        tracing::debug!(subject = ?self.principal().subject(), "policy denied action");
        Err(Unauthorized)
    }

    /// Admins pass; everybody else needs `predicate`.
    fn require<F>(&self, predicate: F) -> AuthzResult<()>
    where
        F: FnOnce(&Principal) -> bool,
    {
        let principal = self.principal();
        if principal.is_admin() || predicate(principal) {
            return self.allow();
        }
        self.deny()
    }

    /// Admins pass; everybody else needs an entity that satisfies `predicate`.
    fn require_entity<F>(&self, entity: Option<&T>, predicate: F) -> AuthzResult<()>
    where
        F: FnOnce(&Principal, &T) -> bool,
    {
        let principal = self.principal();
        if principal.is_admin() {
            return self.allow();
        }
        match entity {
            Some(entity) if predicate(principal, entity) => self.allow(),
            _ => self.deny(),
        }
    }
}
