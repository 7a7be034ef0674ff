//! Storage abstraction for awards and elections.
//!
//! # Purpose
//! Handlers and policies depend on [`Store`] only. Two backends exist: an
//! in-process map store for development and tests, and a Postgres store for
//! deployments.
//!
//! # Key invariants
//! - Lookups by id that find nothing fail with [`StoreError::NotFound`]
//!   carrying a caller-facing message.
//! - Writes rejected by a relational constraint fail with
//!   [`StoreError::Constraint`] carrying the store's own message.
//! - Award writes are audited with the acting subject supplied by the caller.
use crate::model::{
    Award, AwardRevision, Election, ElectionDetails, NewElection, Nomination, Position,
};
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Constraint(String),
    #[error("database failure: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl StoreError {
    pub fn award_not_found(id: Uuid) -> Self {
        StoreError::NotFound(format!("Could not find award with ID: {id}"))
    }

    pub fn election_not_found(id: i64) -> Self {
        StoreError::NotFound(format!("Could not find election with ID: {id}"))
    }

    pub fn position_not_found(id: i64) -> Self {
        StoreError::NotFound(format!("Could not find election position with ID: {id}"))
    }

    pub fn nomination_not_found(id: i64) -> Self {
        StoreError::NotFound(format!("Could not find election nomination with ID: {id}"))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    async fn list_awards(&self) -> StoreResult<Vec<Award>>;
    async fn get_award(&self, id: Uuid) -> StoreResult<Award>;
    async fn create_award(&self, award: Award, user_id: &str) -> StoreResult<Award>;
    async fn update_award(&self, award: Award, user_id: &str) -> StoreResult<Award>;
    async fn delete_award(&self, id: Uuid, user_id: &str) -> StoreResult<()>;
    async fn award_revisions(&self, id: Uuid) -> StoreResult<Vec<AwardRevision>>;

    async fn list_elections(&self) -> StoreResult<Vec<Election>>;
    async fn get_election(&self, id: i64) -> StoreResult<Election>;
    async fn create_election(&self, election: NewElection) -> StoreResult<Election>;
    async fn update_election(&self, id: i64, details: ElectionDetails) -> StoreResult<()>;
    async fn delete_election(&self, id: i64) -> StoreResult<()>;

    async fn create_position(&self, election_id: i64, name: &str) -> StoreResult<Position>;
    async fn update_position(
        &self,
        election_id: i64,
        position_id: i64,
        name: &str,
    ) -> StoreResult<()>;
    async fn delete_position(&self, election_id: i64, position_id: i64) -> StoreResult<()>;

    async fn list_nominations(&self, election_id: i64) -> StoreResult<Vec<Nomination>>;
    async fn get_nomination(&self, election_id: i64, nomination_id: i64)
    -> StoreResult<Nomination>;
    async fn create_nomination(
        &self,
        election_id: i64,
        position_id: i64,
        user_id: &str,
    ) -> StoreResult<Nomination>;
    async fn delete_nomination(&self, election_id: i64, nomination_id: i64) -> StoreResult<()>;

    async fn health_check(&self) -> StoreResult<()>;
    fn is_durable(&self) -> bool;
    fn backend_name(&self) -> &'static str;
}
