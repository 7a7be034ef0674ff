//! Award records and their audit trail.
use backstage_authz::HasAuthor;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Award {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub recurring: bool,
    /// Subject of the member who proposed the award.
    pub suggested_by: String,
    pub approved: bool,
}

impl HasAuthor for Award {
    type AuthorId = String;

    fn author_id(&self) -> &String {
        &self.suggested_by
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RevisionKind {
    Created,
    Updated,
    Deleted,
}

impl RevisionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RevisionKind::Created => "CREATED",
            RevisionKind::Updated => "UPDATED",
            RevisionKind::Deleted => "DELETED",
        }
    }
}

impl std::str::FromStr for RevisionKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "CREATED" => Ok(RevisionKind::Created),
            "UPDATED" => Ok(RevisionKind::Updated),
            "DELETED" => Ok(RevisionKind::Deleted),
            other => Err(format!("unknown revision kind {other}")),
        }
    }
}

/// One audited write to an award, attributed to the acting subject.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AwardRevision {
    pub revision: i64,
    pub award_id: Uuid,
    pub kind: RevisionKind,
    pub user_id: String,
    #[serde(with = "crate::time::datetime")]
    #[schema(value_type = String)]
    pub timestamp: NaiveDateTime,
    /// State after the write; absent for deletions.
    pub snapshot: Option<Award>,
}
