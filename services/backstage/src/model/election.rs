//! Elections, the positions they fill and the nominations for them.
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ElectionType {
    Full,
    ByElection,
}

impl ElectionType {
    pub fn as_str(self) -> &'static str {
        match self {
            ElectionType::Full => "FULL",
            ElectionType::ByElection => "BY_ELECTION",
        }
    }
}

impl std::str::FromStr for ElectionType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "FULL" => Ok(ElectionType::Full),
            "BY_ELECTION" => Ok(ElectionType::ByElection),
            other => Err(format!("unknown election type {other}")),
        }
    }
}

/// Inclusive window between two local date-times.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq)]
pub struct DateTimeBand {
    #[serde(with = "crate::time::datetime")]
    #[schema(value_type = String, example = "2024-02-01 09:00:00")]
    pub start: NaiveDateTime,
    #[serde(with = "crate::time::datetime")]
    #[schema(value_type = String, example = "2024-02-14 17:00:00")]
    pub end: NaiveDateTime,
}

/// Everything about an election that an update replaces.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ElectionDetails {
    #[serde(rename = "type")]
    pub kind: ElectionType,
    pub nominations: DateTimeBand,
    pub voting: DateTimeBand,
    #[serde(default, with = "crate::time::option_datetime")]
    #[schema(value_type = Option<String>)]
    pub hustings_start: Option<NaiveDateTime>,
    #[serde(default)]
    pub hustings_location: Option<String>,
    #[serde(default)]
    pub bath_student_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct Position {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct Election {
    pub id: i64,
    #[serde(flatten)]
    pub details: ElectionDetails,
    pub positions: Vec<Position>,
}

/// Input for creating an election together with its initial positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewElection {
    pub details: ElectionDetails,
    pub position_names: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Nomination {
    pub id: i64,
    pub election_id: i64,
    pub position_id: i64,
    /// Subject of the nominee.
    pub user_id: String,
    pub elected: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn election_flattens_details() {
        let start = crate::time::parse("2024-02-01 09:00:00").expect("start");
        let end = crate::time::parse("2024-02-14 17:00:00").expect("end");
        let election = Election {
            id: 3,
            details: ElectionDetails {
                kind: ElectionType::ByElection,
                nominations: DateTimeBand { start, end },
                voting: DateTimeBand { start, end },
                hustings_start: None,
                hustings_location: Some("Room 1".to_string()),
                bath_student_id: None,
            },
            positions: vec![Position {
                id: 9,
                name: "Chair".to_string(),
            }],
        };
        let value = serde_json::to_value(&election).expect("serialize");
        assert_eq!(value["type"], "BY_ELECTION");
        assert_eq!(value["nominations"]["start"], "2024-02-01 09:00:00");
        assert_eq!(value["hustingsLocation"], "Room 1");
        assert_eq!(value["hustingsStart"], serde_json::Value::Null);
        assert_eq!(value["positions"], json!([{"id": 9, "name": "Chair"}]));
    }

    #[test]
    fn election_type_roundtrip() {
        for kind in [ElectionType::Full, ElectionType::ByElection] {
            assert_eq!(kind.as_str().parse::<ElectionType>(), Ok(kind));
            assert_eq!(
                serde_json::to_value(kind).expect("serialize"),
                json!(kind.as_str())
            );
        }
    }
}
