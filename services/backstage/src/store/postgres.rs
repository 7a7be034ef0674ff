//! Postgres-backed implementation of the backstage store.
//!
//! # Purpose
//! Implements [`Store`] on `sqlx` with a pooled connection. Awards carry an
//! append-only revision table written in the same transaction as the award
//! row, so every committed write has exactly one audit entry.
//!
//! # Key invariants
//! - `election_nomination` allows one row per nominee and position.
//! - Positions referenced by a nomination cannot be deleted.
//! - Integrity violations (SQLSTATE class 23) surface as
//!   [`StoreError::Constraint`] with the database's own message.
//!
//! # Operational notes
//! - Migrations run at startup via `sqlx::migrate!("./migrations")`.
//! - Database URLs may contain credentials; never log `pg.url`.
use super::{Store, StoreError, StoreResult};
use crate::config::PostgresConfig;
use crate::model::{
    Award, AwardRevision, DateTimeBand, Election, ElectionDetails, ElectionType, NewElection,
    Nomination, Position, RevisionKind,
};
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde_json::Value;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

/// Durable store backed by Postgres.
///
/// # Example
/// ```rust,no_run
/// use backstage::config::PostgresConfig;
/// use backstage::store::postgres::PostgresStore;
///
/// async fn open(pg: PostgresConfig) {
///     let _ = PostgresStore::connect(&pg).await;
/// }
/// ```
pub struct PostgresStore {
    pool: PgPool,
}

#[derive(Debug, Clone, FromRow)]
struct DbAward {
    id: Uuid,
    name: String,
    description: Option<String>,
    recurring: bool,
    suggested_by: String,
    approved: bool,
}

#[derive(Debug, Clone, FromRow)]
struct DbRevision {
    revision: i64,
    award_id: Uuid,
    kind: String,
    user_id: String,
    revised_at: NaiveDateTime,
    snapshot: Option<Value>,
}

#[derive(Debug, Clone, FromRow)]
struct DbElection {
    id: i64,
    election_type: String,
    nominations_start: NaiveDateTime,
    nominations_end: NaiveDateTime,
    voting_start: NaiveDateTime,
    voting_end: NaiveDateTime,
    hustings_start: Option<NaiveDateTime>,
    hustings_location: Option<String>,
    bath_student_id: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
struct DbPosition {
    id: i64,
    election_id: i64,
    name: String,
}

#[derive(Debug, Clone, FromRow)]
struct DbNomination {
    id: i64,
    election_id: i64,
    position_id: i64,
    user_id: String,
    elected: bool,
}

const ELECTION_COLUMNS: &str = "id, election_type, nominations_start, nominations_end, \
     voting_start, voting_end, hustings_start, hustings_location, bath_student_id";

impl PostgresStore {
    /// Connect, size the pool and apply pending migrations.
    ///
    /// # Errors
    /// - Invalid URL, unreachable server, pool timeout or a failed migration.
    pub async fn connect(pg: &PostgresConfig) -> StoreResult<Self> {
        #[cfg(any(test, feature = "pg-tests"))]
        let _ = Self::connect_without_migrations;
        Self::connect_internal(pg, true).await
    }

    /// Connect against an existing schema. Used by tests that migrate
    /// separately.
    #[cfg(any(test, feature = "pg-tests"))]
    pub async fn connect_without_migrations(pg: &PostgresConfig) -> StoreResult<Self> {
        Self::connect_internal(pg, false).await
    }

    async fn connect_internal(pg: &PostgresConfig, run_migrations: bool) -> StoreResult<Self> {
        let connect_options = PgConnectOptions::from_str(&pg.url)?;
        let connecting = PgPoolOptions::new()
            .max_connections(pg.max_connections)
            .acquire_timeout(Duration::from_millis(pg.acquire_timeout_ms))
            .connect_with(connect_options);
        let pool = tokio::time::timeout(Duration::from_millis(pg.connect_timeout_ms), connecting)
            .await
            .map_err(|_| anyhow!("timed out connecting to postgres"))??;

        if run_migrations {
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .map_err(|err| StoreError::Unexpected(err.into()))?;
        }
        let store = Self { pool };
        store.refresh_counts().await?;
        Ok(store)
    }

    async fn refresh_counts(&self) -> StoreResult<()> {
        let (awards,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM awards")
            .fetch_one(&self.pool)
            .await?;
        metrics::gauge!("backstage_awards_total").set(awards as f64);
        Ok(())
    }

    async fn audit(
        tx: &mut Transaction<'_, Postgres>,
        award_id: Uuid,
        kind: RevisionKind,
        user_id: &str,
        snapshot: Option<&Award>,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"INSERT INTO award_revisions (award_id, kind, user_id, revised_at, snapshot)
               VALUES ($1, $2, $3, $4, $5)"#,
        )
        .bind(award_id)
        .bind(kind.as_str())
        .bind(user_id)
        .bind(crate::time::now())
        .bind(snapshot.and_then(|award| serde_json::to_value(award).ok()))
        .execute(&mut **tx)
        .await?;
        metrics::counter!("backstage_award_revisions_total", "kind" => kind.as_str()).increment(1);
        Ok(())
    }

    async fn fetch_election(&self, id: i64) -> StoreResult<DbElection> {
        sqlx::query_as::<_, DbElection>(&format!(
            "SELECT {ELECTION_COLUMNS} FROM election WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::election_not_found(id))
    }

    async fn positions_of(&self, election_ids: &[i64]) -> StoreResult<Vec<DbPosition>> {
        let rows = sqlx::query_as::<_, DbPosition>(
            "SELECT id, election_id, name FROM election_position \
             WHERE election_id = ANY($1) ORDER BY id",
        )
        .bind(election_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn ensure_election(&self, id: i64) -> StoreResult<()> {
        let found: Option<(i64,)> = sqlx::query_as("SELECT id FROM election WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        found
            .map(|_| ())
            .ok_or_else(|| StoreError::election_not_found(id))
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn list_awards(&self) -> StoreResult<Vec<Award>> {
        let rows = sqlx::query_as::<_, DbAward>(
            "SELECT id, name, description, recurring, suggested_by, approved \
             FROM awards ORDER BY name, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(award_from_db).collect())
    }

    async fn get_award(&self, id: Uuid) -> StoreResult<Award> {
        sqlx::query_as::<_, DbAward>(
            "SELECT id, name, description, recurring, suggested_by, approved \
             FROM awards WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(award_from_db)
        .ok_or_else(|| StoreError::award_not_found(id))
    }

    async fn create_award(&self, award: Award, user_id: &str) -> StoreResult<Award> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"INSERT INTO awards (id, name, description, recurring, suggested_by, approved)
               VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(award.id)
        .bind(&award.name)
        .bind(&award.description)
        .bind(award.recurring)
        .bind(&award.suggested_by)
        .bind(award.approved)
        .execute(&mut *tx)
        .await
        .map_err(constraint_or_database)?;
        Self::audit(&mut tx, award.id, RevisionKind::Created, user_id, Some(&award)).await?;
        tx.commit().await?;
        self.refresh_counts().await?;
        Ok(award)
    }

    async fn update_award(&self, award: Award, user_id: &str) -> StoreResult<Award> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            r#"UPDATE awards
               SET name = $2, description = $3, recurring = $4, suggested_by = $5, approved = $6
               WHERE id = $1"#,
        )
        .bind(award.id)
        .bind(&award.name)
        .bind(&award.description)
        .bind(award.recurring)
        .bind(&award.suggested_by)
        .bind(award.approved)
        .execute(&mut *tx)
        .await
        .map_err(constraint_or_database)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::award_not_found(award.id));
        }
        Self::audit(&mut tx, award.id, RevisionKind::Updated, user_id, Some(&award)).await?;
        tx.commit().await?;
        Ok(award)
    }

    async fn delete_award(&self, id: Uuid, user_id: &str) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM awards WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(constraint_or_database)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::award_not_found(id));
        }
        Self::audit(&mut tx, id, RevisionKind::Deleted, user_id, None).await?;
        tx.commit().await?;
        self.refresh_counts().await?;
        Ok(())
    }

    async fn award_revisions(&self, id: Uuid) -> StoreResult<Vec<AwardRevision>> {
        let rows = sqlx::query_as::<_, DbRevision>(
            "SELECT revision, award_id, kind, user_id, revised_at, snapshot \
             FROM award_revisions WHERE award_id = $1 ORDER BY revision",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        if rows.is_empty() {
            return Err(StoreError::award_not_found(id));
        }
        rows.into_iter().map(revision_from_db).collect()
    }

    async fn list_elections(&self) -> StoreResult<Vec<Election>> {
        let rows = sqlx::query_as::<_, DbElection>(&format!(
            "SELECT {ELECTION_COLUMNS} FROM election ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;
        let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
        let positions = self.positions_of(&ids).await?;
        rows.into_iter()
            .map(|row| {
                let own = positions
                    .iter()
                    .filter(|position| position.election_id == row.id)
                    .cloned()
                    .collect();
                election_from_db(row, own)
            })
            .collect()
    }

    async fn get_election(&self, id: i64) -> StoreResult<Election> {
        let row = self.fetch_election(id).await?;
        let positions = self.positions_of(&[id]).await?;
        election_from_db(row, positions)
    }

    async fn create_election(&self, election: NewElection) -> StoreResult<Election> {
        let details = election.details;
        let mut tx = self.pool.begin().await?;
        let (id,): (i64,) = sqlx::query_as(
            r#"INSERT INTO election (election_type, nominations_start, nominations_end,
                   voting_start, voting_end, hustings_start, hustings_location, bath_student_id)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
               RETURNING id"#,
        )
        .bind(details.kind.as_str())
        .bind(details.nominations.start)
        .bind(details.nominations.end)
        .bind(details.voting.start)
        .bind(details.voting.end)
        .bind(details.hustings_start)
        .bind(&details.hustings_location)
        .bind(&details.bath_student_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(constraint_or_database)?;

        let mut positions = Vec::with_capacity(election.position_names.len());
        for name in election.position_names {
            let (position_id,): (i64,) = sqlx::query_as(
                "INSERT INTO election_position (election_id, name) VALUES ($1, $2) RETURNING id",
            )
            .bind(id)
            .bind(&name)
            .fetch_one(&mut *tx)
            .await
            .map_err(constraint_or_database)?;
            positions.push(Position {
                id: position_id,
                name,
            });
        }
        tx.commit().await?;
        Ok(Election {
            id,
            details,
            positions,
        })
    }

    async fn update_election(&self, id: i64, details: ElectionDetails) -> StoreResult<()> {
        let result = sqlx::query(
            r#"UPDATE election
               SET election_type = $2, nominations_start = $3, nominations_end = $4,
                   voting_start = $5, voting_end = $6, hustings_start = $7,
                   hustings_location = $8, bath_student_id = $9
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(details.kind.as_str())
        .bind(details.nominations.start)
        .bind(details.nominations.end)
        .bind(details.voting.start)
        .bind(details.voting.end)
        .bind(details.hustings_start)
        .bind(&details.hustings_location)
        .bind(&details.bath_student_id)
        .execute(&self.pool)
        .await
        .map_err(constraint_or_database)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::election_not_found(id));
        }
        Ok(())
    }

    async fn delete_election(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM election WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(constraint_or_database)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::election_not_found(id));
        }
        Ok(())
    }

    async fn create_position(&self, election_id: i64, name: &str) -> StoreResult<Position> {
        self.ensure_election(election_id).await?;
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO election_position (election_id, name) VALUES ($1, $2) RETURNING id",
        )
        .bind(election_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(constraint_or_database)?;
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
        self.ensure_election(election_id).await?;
        let result =
            sqlx::query("UPDATE election_position SET name = $3 WHERE id = $2 AND election_id = $1")
                .bind(election_id)
                .bind(position_id)
                .bind(name)
                .execute(&self.pool)
                .await
                .map_err(constraint_or_database)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::position_not_found(position_id));
        }
        Ok(())
    }

    async fn delete_position(&self, election_id: i64, position_id: i64) -> StoreResult<()> {
        self.ensure_election(election_id).await?;
        let result = sqlx::query("DELETE FROM election_position WHERE id = $2 AND election_id = $1")
            .bind(election_id)
            .bind(position_id)
            .execute(&self.pool)
            .await
            .map_err(constraint_or_database)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::position_not_found(position_id));
        }
        Ok(())
    }

    async fn list_nominations(&self, election_id: i64) -> StoreResult<Vec<Nomination>> {
        self.ensure_election(election_id).await?;
        let rows = sqlx::query_as::<_, DbNomination>(
            "SELECT id, election_id, position_id, user_id, elected \
             FROM election_nomination WHERE election_id = $1 ORDER BY id",
        )
        .bind(election_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(nomination_from_db).collect())
    }

    async fn get_nomination(
        &self,
        election_id: i64,
        nomination_id: i64,
    ) -> StoreResult<Nomination> {
        self.ensure_election(election_id).await?;
        sqlx::query_as::<_, DbNomination>(
            "SELECT id, election_id, position_id, user_id, elected \
             FROM election_nomination WHERE id = $2 AND election_id = $1",
        )
        .bind(election_id)
        .bind(nomination_id)
        .fetch_optional(&self.pool)
        .await?
        .map(nomination_from_db)
        .ok_or_else(|| StoreError::nomination_not_found(nomination_id))
    }

    async fn create_nomination(
        &self,
        election_id: i64,
        position_id: i64,
        user_id: &str,
    ) -> StoreResult<Nomination> {
        self.ensure_election(election_id).await?;
        let owned: Option<(i64,)> = sqlx::query_as(
            "SELECT id FROM election_position WHERE id = $2 AND election_id = $1",
        )
        .bind(election_id)
        .bind(position_id)
        .fetch_optional(&self.pool)
        .await?;
        if owned.is_none() {
            return Err(StoreError::position_not_found(position_id));
        }
        let row = sqlx::query_as::<_, DbNomination>(
            r#"INSERT INTO election_nomination (election_id, position_id, user_id)
               VALUES ($1, $2, $3)
               RETURNING id, election_id, position_id, user_id, elected"#,
        )
        .bind(election_id)
        .bind(position_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(constraint_or_database)?;
        Ok(nomination_from_db(row))
    }

    async fn delete_nomination(&self, election_id: i64, nomination_id: i64) -> StoreResult<()> {
        self.ensure_election(election_id).await?;
        let result =
            sqlx::query("DELETE FROM election_nomination WHERE id = $2 AND election_id = $1")
                .bind(election_id)
                .bind(nomination_id)
                .execute(&self.pool)
                .await
                .map_err(constraint_or_database)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::nomination_not_found(nomination_id));
        }
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn is_durable(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

/// Integrity violations become [`StoreError::Constraint`]; anything else
/// stays a database failure.
fn constraint_or_database(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        let integrity = db_err
            .code()
            .map(|code| code.starts_with("23"))
            .unwrap_or(false);
        if integrity {
            return StoreError::Constraint(db_err.message().to_string());
        }
    }
    StoreError::Database(err)
}

fn award_from_db(row: DbAward) -> Award {
    Award {
        id: row.id,
        name: row.name,
        description: row.description,
        recurring: row.recurring,
        suggested_by: row.suggested_by,
        approved: row.approved,
    }
}

fn revision_from_db(row: DbRevision) -> StoreResult<AwardRevision> {
    let kind = RevisionKind::from_str(&row.kind).map_err(|err| anyhow!(err))?;
    let snapshot = row
        .snapshot
        .map(serde_json::from_value::<Award>)
        .transpose()
        .map_err(|err| anyhow!("decode award snapshot: {err}"))?;
    Ok(AwardRevision {
        revision: row.revision,
        award_id: row.award_id,
        kind,
        user_id: row.user_id,
        timestamp: row.revised_at,
        snapshot,
    })
}

fn election_from_db(row: DbElection, positions: Vec<DbPosition>) -> StoreResult<Election> {
    let kind = ElectionType::from_str(&row.election_type).map_err(|err| anyhow!(err))?;
    Ok(Election {
        id: row.id,
        details: ElectionDetails {
            kind,
            nominations: DateTimeBand {
                start: row.nominations_start,
                end: row.nominations_end,
            },
            voting: DateTimeBand {
                start: row.voting_start,
                end: row.voting_end,
            },
            hustings_start: row.hustings_start,
            hustings_location: row.hustings_location,
            bath_student_id: row.bath_student_id,
        },
        positions: positions
            .into_iter()
            .map(|position| Position {
                id: position.id,
                name: position.name,
            })
            .collect(),
    })
}

fn nomination_from_db(row: DbNomination) -> Nomination {
    Nomination {
        id: row.id,
        election_id: row.election_id,
        position_id: row.position_id,
        user_id: row.user_id,
        elected: row.elected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timestamp() -> NaiveDateTime {
        crate::time::parse("2024-03-01 12:00:00").expect("timestamp")
    }

    #[test]
    fn election_from_db_maps_bands_and_positions() {
        let row = DbElection {
            id: 4,
            election_type: "BY_ELECTION".to_string(),
            nominations_start: timestamp(),
            nominations_end: timestamp(),
            voting_start: timestamp(),
            voting_end: timestamp(),
            hustings_start: None,
            hustings_location: Some("Hall".to_string()),
            bath_student_id: None,
        };
        let election = election_from_db(
            row,
            vec![DbPosition {
                id: 7,
                election_id: 4,
                name: "Chair".to_string(),
            }],
        )
        .expect("election");
        assert_eq!(election.details.kind, ElectionType::ByElection);
        assert_eq!(election.details.voting.end, timestamp());
        assert_eq!(election.positions, vec![Position { id: 7, name: "Chair".to_string() }]);
    }

    #[test]
    fn unknown_election_type_is_unexpected() {
        let row = DbElection {
            id: 1,
            election_type: "SNAP".to_string(),
            nominations_start: timestamp(),
            nominations_end: timestamp(),
            voting_start: timestamp(),
            voting_end: timestamp(),
            hustings_start: None,
            hustings_location: None,
            bath_student_id: None,
        };
        let err = election_from_db(row, Vec::new()).expect_err("unknown type");
        assert!(matches!(err, StoreError::Unexpected(_)));
    }

    #[test]
    fn revision_from_db_decodes_snapshot() {
        let award = Award {
            id: Uuid::nil(),
            name: "Volunteer of the year".to_string(),
            description: Some("For effort".to_string()),
            recurring: true,
            suggested_by: "alice".to_string(),
            approved: false,
        };
        let revision = revision_from_db(DbRevision {
            revision: 2,
            award_id: award.id,
            kind: "UPDATED".to_string(),
            user_id: "committee-1".to_string(),
            revised_at: timestamp(),
            snapshot: Some(serde_json::to_value(&award).expect("json")),
        })
        .expect("revision");
        assert_eq!(revision.kind, RevisionKind::Updated);
        assert_eq!(revision.snapshot, Some(award));
    }

    #[test]
    fn non_database_errors_are_not_constraints() {
        let err = constraint_or_database(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Database(_)));
    }
}
