//! Request principal and the closed role set.
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Roles recognised by the service. Tokens may carry other group names; they
/// are kept on the principal but never satisfy a role check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ROLE_MEMBER")]
    Member,
    #[serde(rename = "ROLE_COMMITTEE")]
    Committee,
    #[serde(rename = "ROLE_SUPER_ADMIN")]
    SuperAdmin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Member => "ROLE_MEMBER",
            Role::Committee => "ROLE_COMMITTEE",
            Role::SuperAdmin => "ROLE_SUPER_ADMIN",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated (or anonymous) caller of one request.
///
/// Built once per request from verified token claims and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Principal {
    subject: Option<String>,
    roles: BTreeSet<String>,
}

impl Principal {
    pub fn new<I, R>(subject: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        Self {
            subject: Some(subject.into()),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    /// Caller without a verified token: no subject, no roles.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.roles.iter().map(String::as_str)
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(role.as_str())
    }

    pub fn is_member(&self) -> bool {
        self.has_role(Role::Member)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Committee) || self.has_role(Role::SuperAdmin)
    }
}
