use crate::AuthzError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Administrator,
    Teacher,
    Student,
    Parent,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::Administrator,
        Role::Teacher,
        Role::Student,
        Role::Parent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Administrator => "administrator",
            Role::Teacher => "teacher",
            Role::Student => "student",
            Role::Parent => "parent",
        }
    }

    /// Plural resource name under which accounts of this role are managed.
    pub fn collection(self) -> &'static str {
        match self {
            Role::Administrator => "administrators",
            Role::Teacher => "teachers",
            Role::Student => "students",
            Role::Parent => "parents",
        }
    }

    pub fn from_collection(value: &str) -> Option<Role> {
        Role::ALL
            .into_iter()
            .find(|role| role.collection() == value)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = AuthzError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "administrator" | "admin" => Ok(Role::Administrator),
            "teacher" => Ok(Role::Teacher),
            "student" => Ok(Role::Student),
            "parent" | "guardian" => Ok(Role::Parent),
            other => Err(AuthzError::InvalidRole(other.to_string())),
        }
    }
}
