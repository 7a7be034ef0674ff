//! Request authentication and the domain access policies.
//!
//! # Purpose
//! Turns bearer tokens into [`backstage_authz::Principal`]s and defines one
//! policy per resource on top of the generic authorization primitives.
pub mod policies;
pub mod token;

pub use policies::{AwardAction, AwardPolicy, ElectionPolicy, MenuAction, MenuPolicy, NominationAction, NominationPolicy};
pub use token::{Claims, TokenError, TokenVerifier};
