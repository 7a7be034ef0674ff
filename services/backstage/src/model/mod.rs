//! Backstage data model.
//!
//! # Purpose
//! Domain records shared by the API handlers, the policies and the stores.
mod award;
mod election;
mod menu;

pub use award::{Award, AwardRevision, RevisionKind};
pub use election::{
    DateTimeBand, Election, ElectionDetails, ElectionType, NewElection, Nomination, Position,
};
pub use menu::{AdminMenuItem, MainMenuItem, MenuLink, admin_menu, main_menu};
