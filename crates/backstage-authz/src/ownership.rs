//! Ownership helpers used inside policy predicates.
use crate::Principal;
use std::fmt::Display;

/// Entity that records who authored it.
pub trait HasAuthor {
    type AuthorId: Display;

    fn author_id(&self) -> &Self::AuthorId;
}

/// True when `entity` exists and its extracted owner, rendered as a string,
/// equals the principal's subject. Anonymous principals own nothing.
pub fn is_author<T, O, F>(principal: &Principal, entity: Option<&T>, extract: F) -> bool
where
    O: Display,
    F: FnOnce(&T) -> O,
{
    match (principal.subject(), entity) {
        (Some(subject), Some(entity)) => extract(entity).to_string() == subject,
        _ => false,
    }
}

/// [`is_author`] using the entity's own author field.
pub fn is_author_of<T: HasAuthor>(principal: &Principal, entity: Option<&T>) -> bool {
    is_author(principal, entity, |entity| entity.author_id().to_string())
}
