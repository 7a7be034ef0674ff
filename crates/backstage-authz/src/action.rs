use serde::{Deserialize, Serialize};

/// Generic verbs shared by every CRUD-shaped resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CrudAction {
    List,
    Create,
    View,
    Update,
    Delete,
}

impl CrudAction {
    pub fn as_str(self) -> &'static str {
        match self {
            CrudAction::List => "LIST",
            CrudAction::Create => "CREATE",
            CrudAction::View => "VIEW",
            CrudAction::Update => "UPDATE",
            CrudAction::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for CrudAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
