//! Request and response payloads of the HTTP API.
use crate::model::{DateTimeBand, ElectionDetails, ElectionType};
use crate::validation::{ConstraintViolations, Validate, Validator};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of award creation and update; an update replaces all three fields.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AwardRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub recurring: bool,
}

impl Validate for AwardRequest {
    fn validate(&self) -> Result<(), ConstraintViolations> {
        Validator::new()
            .not_blank("name", &self.name)
            .not_blank_if_present("description", self.description.as_deref())
            .finish()
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PositionRequest {
    pub name: String,
}

impl Validate for PositionRequest {
    fn validate(&self) -> Result<(), ConstraintViolations> {
        Validator::new().not_blank("name", &self.name).finish()
    }
}

/// Election fields accepted on update.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateElection {
    #[serde(rename = "type")]
    pub kind: ElectionType,
    pub nominations: DateTimeBand,
    pub voting: DateTimeBand,
    #[serde(default, with = "crate::time::option_datetime")]
    #[schema(value_type = Option<String>, example = "2024-02-10 18:00:00")]
    pub hustings_start: Option<NaiveDateTime>,
    #[serde(default)]
    pub hustings_location: Option<String>,
    #[serde(default)]
    pub bath_student_id: Option<String>,
}

impl UpdateElection {
    pub fn into_details(self) -> ElectionDetails {
        ElectionDetails {
            kind: self.kind,
            nominations: self.nominations,
            voting: self.voting,
            hustings_start: self.hustings_start,
            hustings_location: self.hustings_location,
            bath_student_id: self.bath_student_id,
        }
    }
}

impl Validate for UpdateElection {
    fn validate(&self) -> Result<(), ConstraintViolations> {
        Validator::new()
            .date_range("nominations", self.nominations.start, self.nominations.end)
            .date_range("voting", self.voting.start, self.voting.end)
            .not_blank_if_present("hustingsLocation", self.hustings_location.as_deref())
            .finish()
    }
}

/// Election fields plus its initial positions. The fields are spelled out
/// rather than flattened so binding failures keep exact field paths.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateElection {
    #[serde(rename = "type")]
    pub kind: ElectionType,
    pub nominations: DateTimeBand,
    pub voting: DateTimeBand,
    #[serde(default, with = "crate::time::option_datetime")]
    #[schema(value_type = Option<String>, example = "2024-02-10 18:00:00")]
    pub hustings_start: Option<NaiveDateTime>,
    #[serde(default)]
    pub hustings_location: Option<String>,
    #[serde(default)]
    pub bath_student_id: Option<String>,
    pub positions: Vec<PositionRequest>,
}

impl CreateElection {
    /// Split into the election's details and the names of its positions.
    pub fn into_parts(self) -> (ElectionDetails, Vec<String>) {
        let positions = self
            .positions
            .into_iter()
            .map(|position| position.name)
            .collect();
        let details = UpdateElection {
            kind: self.kind,
            nominations: self.nominations,
            voting: self.voting,
            hustings_start: self.hustings_start,
            hustings_location: self.hustings_location,
            bath_student_id: self.bath_student_id,
        }
        .into_details();
        (details, positions)
    }
}

impl Validate for CreateElection {
    fn validate(&self) -> Result<(), ConstraintViolations> {
        let mut validator = Validator::new();
        validator
            .date_range("nominations", self.nominations.start, self.nominations.end)
            .date_range("voting", self.voting.start, self.voting.end)
            .not_blank_if_present("hustingsLocation", self.hustings_location.as_deref())
            .not_empty("positions", &self.positions)
            .each("positions", &self.positions, |nested, position| {
                nested.not_blank("name", &position.name);
            });
        validator.finish()
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateNomination {
    pub position_id: i64,
}

impl Validate for CreateNomination {
    fn validate(&self) -> Result<(), ConstraintViolations> {
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct HealthCheck {
    pub name: String,
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct HealthReport {
    pub status: String,
    pub checks: Vec<HealthCheck>,
}

pub const STATUS_UP: &str = "UP";
pub const STATUS_DOWN: &str = "DOWN";

impl HealthReport {
    pub fn from_checks(checks: Vec<HealthCheck>) -> Self {
        let status = if checks.iter().all(|check| check.status == STATUS_UP) {
            STATUS_UP
        } else {
            STATUS_DOWN
        };
        Self {
            status: status.to_string(),
            checks,
        }
    }

    pub fn is_up(&self) -> bool {
        self.status == STATUS_UP
    }
}

impl HealthCheck {
    pub fn new(name: &str, up: bool) -> Self {
        Self {
            name: name.to_string(),
            status: if up { STATUS_UP } else { STATUS_DOWN }.to_string(),
        }
    }
}
