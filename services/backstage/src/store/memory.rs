//! In-memory implementation of the backstage store.
//!
//! # Purpose
//! Implements [`Store`] with maps guarded by `tokio::sync::RwLock`. Used for
//! local development and tests.
//!
//! # Durability and consistency
//! - Not durable: all state is lost on restart.
//! - Awards and elections each sit behind one lock so cross-record checks
//!   (position belongs to election, one nomination per nominee and position)
//!   are evaluated atomically with the write.
//! - Relational constraints of the Postgres schema are emulated and reported
//!   as [`StoreError::Constraint`].
use super::{Store, StoreError, StoreResult};
use crate::model::{
    Award, AwardRevision, Election, ElectionDetails, NewElection, Nomination, Position,
    RevisionKind,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Append-only audit log; revision numbers are assigned by this process.
#[derive(Debug, Default)]
struct RevisionLog {
    next_revision: i64,
    items: Vec<AwardRevision>,
}

impl RevisionLog {
    fn record(&mut self, item: impl FnOnce(i64) -> AwardRevision) -> i64 {
        self.next_revision += 1;
        let revision = self.next_revision;
        self.items.push(item(revision));
        revision
    }
}

#[derive(Debug, Default)]
struct AwardTables {
    awards: HashMap<Uuid, Award>,
    revisions: RevisionLog,
}

impl AwardTables {
    fn audit(&mut self, award_id: Uuid, kind: RevisionKind, user_id: &str, snapshot: Option<Award>) {
        self.revisions.record(|revision| AwardRevision {
            revision,
            award_id,
            kind,
            user_id: user_id.to_string(),
            timestamp: crate::time::now(),
            snapshot,
        });
        metrics::counter!("backstage_award_revisions_total", "kind" => kind.as_str()).increment(1);
        metrics::gauge!("backstage_awards_total").set(self.awards.len() as f64);
    }
}

#[derive(Debug)]
struct StoredElection {
    details: ElectionDetails,
    /// Ordered by id so listings are stable.
    positions: BTreeMap<i64, String>,
}

#[derive(Debug, Default)]
struct ElectionTables {
    next_id: i64,
    elections: BTreeMap<i64, StoredElection>,
    nominations: BTreeMap<i64, Nomination>,
}

impl ElectionTables {
    /// Ids are shared by elections, positions and nominations, like a single
    /// database sequence.
    fn allocate(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn election(&self, id: i64) -> StoreResult<&StoredElection> {
        self.elections
            .get(&id)
            .ok_or_else(|| StoreError::election_not_found(id))
    }

    fn election_mut(&mut self, id: i64) -> StoreResult<&mut StoredElection> {
        self.elections
            .get_mut(&id)
            .ok_or_else(|| StoreError::election_not_found(id))
    }

    fn to_election(id: i64, stored: &StoredElection) -> Election {
        Election {
            id,
            details: stored.details.clone(),
            positions: stored
                .positions
                .iter()
                .map(|(id, name)| Position {
                    id: *id,
                    name: name.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    awards: RwLock<AwardTables>,
    elections: RwLock<ElectionTables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn list_awards(&self) -> StoreResult<Vec<Award>> {
        let tables = self.awards.read().await;
        let mut awards: Vec<Award> = tables.awards.values().cloned().collect();
        awards.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(awards)
    }

    async fn get_award(&self, id: Uuid) -> StoreResult<Award> {
        let tables = self.awards.read().await;
        tables
            .awards
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::award_not_found(id))
    }

    async fn create_award(&self, award: Award, user_id: &str) -> StoreResult<Award> {
        let mut tables = self.awards.write().await;
        if tables.awards.contains_key(&award.id) {
            return Err(StoreError::Constraint(format!(
                "award {} already exists",
                award.id
            )));
        }
        tables.awards.insert(award.id, award.clone());
        tables.audit(award.id, RevisionKind::Created, user_id, Some(award.clone()));
        Ok(award)
    }

    async fn update_award(&self, award: Award, user_id: &str) -> StoreResult<Award> {
        let mut tables = self.awards.write().await;
        match tables.awards.get_mut(&award.id) {
            Some(existing) => *existing = award.clone(),
            None => return Err(StoreError::award_not_found(award.id)),
        }
        tables.audit(award.id, RevisionKind::Updated, user_id, Some(award.clone()));
        Ok(award)
    }

    async fn delete_award(&self, id: Uuid, user_id: &str) -> StoreResult<()> {
        let mut tables = self.awards.write().await;
        if tables.awards.remove(&id).is_none() {
            return Err(StoreError::award_not_found(id));
        }
        tables.audit(id, RevisionKind::Deleted, user_id, None);
        Ok(())
    }

    async fn award_revisions(&self, id: Uuid) -> StoreResult<Vec<AwardRevision>> {
        let tables = self.awards.read().await;
        let revisions: Vec<AwardRevision> = tables
            .revisions
            .items
            .iter()
            .filter(|revision| revision.award_id == id)
            .cloned()
            .collect();
        if revisions.is_empty() {
            return Err(StoreError::award_not_found(id));
        }
        Ok(revisions)
    }

    async fn list_elections(&self) -> StoreResult<Vec<Election>> {
        let tables = self.elections.read().await;
        Ok(tables
            .elections
            .iter()
            .map(|(id, stored)| ElectionTables::to_election(*id, stored))
            .collect())
    }

    async fn get_election(&self, id: i64) -> StoreResult<Election> {
        let tables = self.elections.read().await;
        let stored = tables.election(id)?;
        Ok(ElectionTables::to_election(id, stored))
    }

    async fn create_election(&self, election: NewElection) -> StoreResult<Election> {
        let mut tables = self.elections.write().await;
        let id = tables.allocate();
        let mut positions = BTreeMap::new();
        for name in election.position_names {
            positions.insert(tables.allocate(), name);
        }
        let stored = StoredElection {
            details: election.details,
            positions,
        };
        let created = ElectionTables::to_election(id, &stored);
        tables.elections.insert(id, stored);
        Ok(created)
    }

    async fn update_election(&self, id: i64, details: ElectionDetails) -> StoreResult<()> {
        let mut tables = self.elections.write().await;
        tables.election_mut(id)?.details = details;
        Ok(())
    }

    async fn delete_election(&self, id: i64) -> StoreResult<()> {
        let mut tables = self.elections.write().await;
        tables.election(id)?;
        if tables
            .nominations
            .values()
            .any(|nomination| nomination.election_id == id)
        {
            return Err(StoreError::Constraint(format!(
                "election {id} is still referenced by nominations"
            )));
        }
        tables.elections.remove(&id);
        Ok(())
    }

    async fn create_position(&self, election_id: i64, name: &str) -> StoreResult<Position> {
        let mut tables = self.elections.write().await;
        tables.election(election_id)?;
        let id = tables.allocate();
        tables
            .election_mut(election_id)?
            .positions
            .insert(id, name.to_string());
        Ok(Position {
            id,
            name: name.to_string(),
        })
    }

    async fn update_position(
        &self,
        election_id: i64,
        position_id: i64,
        name: &str,
    ) -> StoreResult<()> {
        let mut tables = self.elections.write().await;
        let election = tables.election_mut(election_id)?;
        match election.positions.get_mut(&position_id) {
            Some(existing) => {
                *existing = name.to_string();
                Ok(())
            }
            None => Err(StoreError::position_not_found(position_id)),
        }
    }

    async fn delete_position(&self, election_id: i64, position_id: i64) -> StoreResult<()> {
        let mut tables = self.elections.write().await;
        if !tables.election(election_id)?.positions.contains_key(&position_id) {
            return Err(StoreError::position_not_found(position_id));
        }
        if tables
            .nominations
            .values()
            .any(|nomination| nomination.position_id == position_id)
        {
            return Err(StoreError::Constraint(format!(
                "position {position_id} is still referenced by nominations"
            )));
        }
        tables.election_mut(election_id)?.positions.remove(&position_id);
        Ok(())
    }

    async fn list_nominations(&self, election_id: i64) -> StoreResult<Vec<Nomination>> {
        let tables = self.elections.read().await;
        tables.election(election_id)?;
        Ok(tables
            .nominations
            .values()
            .filter(|nomination| nomination.election_id == election_id)
            .cloned()
            .collect())
    }

    async fn get_nomination(
        &self,
        election_id: i64,
        nomination_id: i64,
    ) -> StoreResult<Nomination> {
        let tables = self.elections.read().await;
        tables.election(election_id)?;
        tables
            .nominations
            .get(&nomination_id)
            .filter(|nomination| nomination.election_id == election_id)
            .cloned()
            .ok_or_else(|| StoreError::nomination_not_found(nomination_id))
    }

    async fn create_nomination(
        &self,
        election_id: i64,
        position_id: i64,
        user_id: &str,
    ) -> StoreResult<Nomination> {
        let mut tables = self.elections.write().await;
        if !tables.election(election_id)?.positions.contains_key(&position_id) {
            return Err(StoreError::position_not_found(position_id));
        }
        if tables
            .nominations
            .values()
            .any(|nomination| nomination.position_id == position_id && nomination.user_id == user_id)
        {
            return Err(StoreError::Constraint(format!(
                "{user_id} is already nominated for position {position_id}"
            )));
        }
        let nomination = Nomination {
            id: tables.allocate(),
            election_id,
            position_id,
            user_id: user_id.to_string(),
            elected: false,
        };
        tables.nominations.insert(nomination.id, nomination.clone());
        Ok(nomination)
    }

    async fn delete_nomination(&self, election_id: i64, nomination_id: i64) -> StoreResult<()> {
        let mut tables = self.elections.write().await;
        tables.election(election_id)?;
        match tables.nominations.get(&nomination_id) {
            Some(nomination) if nomination.election_id == election_id => {
                tables.nominations.remove(&nomination_id);
                Ok(())
            }
            _ => Err(StoreError::nomination_not_found(nomination_id)),
        }
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    fn is_durable(&self) -> bool {
        false
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DateTimeBand, ElectionType};

    fn award(name: &str, author: &str) -> Award {
        Award {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            recurring: false,
            suggested_by: author.to_string(),
            approved: false,
        }
    }

    fn details() -> ElectionDetails {
        let start = crate::time::parse("2024-02-01 09:00:00").expect("start");
        let end = crate::time::parse("2024-02-14 17:00:00").expect("end");
        ElectionDetails {
            kind: ElectionType::Full,
            nominations: DateTimeBand { start, end },
            voting: DateTimeBand { start, end },
            hustings_start: None,
            hustings_location: None,
            bath_student_id: None,
        }
    }

    async fn election_with(store: &InMemoryStore, positions: &[&str]) -> Election {
        store
            .create_election(NewElection {
                details: details(),
                position_names: positions.iter().map(|name| name.to_string()).collect(),
            })
            .await
            .expect("election")
    }

    #[tokio::test]
    async fn award_writes_are_audited() {
        let store = InMemoryStore::new();
        let mut created = store
            .create_award(award("Best newcomer", "alice"), "alice")
            .await
            .expect("create");
        created.approved = true;
        store
            .update_award(created.clone(), "committee-1")
            .await
            .expect("update");
        store.delete_award(created.id, "committee-1").await.expect("delete");

        let revisions = store.award_revisions(created.id).await.expect("revisions");
        let trail: Vec<_> = revisions
            .iter()
            .map(|revision| (revision.kind, revision.user_id.as_str()))
            .collect();
        assert_eq!(
            trail,
            vec![
                (RevisionKind::Created, "alice"),
                (RevisionKind::Updated, "committee-1"),
                (RevisionKind::Deleted, "committee-1"),
            ]
        );
        assert!(revisions[0].revision < revisions[1].revision);
        assert_eq!(revisions[2].snapshot, None);

        let err = store.get_award(created.id).await.expect_err("gone");
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn missing_award_messages() {
        let store = InMemoryStore::new();
        let id = Uuid::nil();
        let err = store.get_award(id).await.expect_err("missing");
        assert_eq!(
            err.to_string(),
            "Could not find award with ID: 00000000-0000-0000-0000-000000000000"
        );
        assert!(store.award_revisions(id).await.is_err());
    }

    #[tokio::test]
    async fn positions_belong_to_their_election() {
        let store = InMemoryStore::new();
        let first = election_with(&store, &["Chair", "Secretary"]).await;
        let second = election_with(&store, &["Treasurer"]).await;
        assert_eq!(first.positions.len(), 2);

        let foreign = second.positions[0].id;
        let err = store
            .update_position(first.id, foreign, "Renamed")
            .await
            .expect_err("foreign position");
        assert!(matches!(err, StoreError::NotFound(_)));

        let added = store.create_position(first.id, "Welfare").await.expect("add");
        let reloaded = store.get_election(first.id).await.expect("reload");
        assert_eq!(reloaded.positions.last(), Some(&added));

        let err = store
            .create_position(9_999, "Nobody")
            .await
            .expect_err("no election");
        assert_eq!(err.to_string(), "Could not find election with ID: 9999");
    }

    #[tokio::test]
    async fn nominations_enforce_constraints() {
        let store = InMemoryStore::new();
        let election = election_with(&store, &["Chair"]).await;
        let chair = election.positions[0].id;

        let nomination = store
            .create_nomination(election.id, chair, "bob")
            .await
            .expect("nominate");
        let err = store
            .create_nomination(election.id, chair, "bob")
            .await
            .expect_err("duplicate");
        assert!(matches!(err, StoreError::Constraint(_)));

        let err = store
            .delete_position(election.id, chair)
            .await
            .expect_err("referenced");
        assert!(matches!(err, StoreError::Constraint(_)));
        let err = store.delete_election(election.id).await.expect_err("referenced");
        assert!(matches!(err, StoreError::Constraint(_)));

        store
            .delete_nomination(election.id, nomination.id)
            .await
            .expect("withdraw");
        store.delete_position(election.id, chair).await.expect("delete position");
        store.delete_election(election.id).await.expect("delete election");
        assert!(store.list_elections().await.expect("list").is_empty());
    }
}
