use crate::{AuthzError, AuthzResult, Role};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod resources {
    pub const ADMINISTRATORS: &str = "administrators";
    pub const TEACHERS: &str = "teachers";
    pub const STUDENTS: &str = "students";
    pub const PARENTS: &str = "parents";
    pub const CLASSES: &str = "classes";
    pub const PROFILES: &str = "profiles";
    pub const SUBJECTS: &str = "subjects";
    pub const GRADES: &str = "grades";
    pub const NEWS: &str = "news";
    pub const PASSWORDS: &str = "passwords";
    pub const RULES: &str = "rules";
}

pub mod operations {
    pub const CREATE: &str = "create";
    pub const DELETE: &str = "delete";
    pub const LIST: &str = "list";
    pub const READ: &str = "read";
    pub const UPDATE: &str = "update";
    pub const WRITE: &str = "write";
    pub const MEMBERS: &str = "members";
    pub const REGISTER: &str = "register";
    /// Matches every operation on the rule's resource.
    pub const ANY: &str = "*";
}

/// One `(resource, operation) -> roles` entry of the access table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AccessRule {
    pub resource: String,
    pub operation: String,
    pub roles: Vec<Role>,
}

impl AccessRule {
    pub fn new(resource: &str, operation: &str, roles: &[Role]) -> Self {
        Self {
            resource: resource.to_string(),
            operation: operation.to_string(),
            roles: roles.to_vec(),
        }
    }

    pub fn validate(&self) -> AuthzResult<()> {
        if self.resource.trim().is_empty() {
            return Err(AuthzError::InvalidRule("resource must not be empty".to_string()));
        }
        if self.operation.trim().is_empty() {
            return Err(AuthzError::InvalidRule(format!(
                "{}: operation must not be empty",
                self.resource
            )));
        }
        if self.roles.is_empty() {
            return Err(AuthzError::InvalidRule(format!(
                "{}:{} grants no role",
                self.resource, self.operation
            )));
        }
        Ok(())
    }
}

/// On-disk shape of an access-rule override file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRuleFile {
    pub rules: Vec<AccessRule>,
}

/// Route guards of the school management API, one rule per operation.
pub fn default_rules() -> Vec<AccessRule> {
    use operations::*;
    use resources::*;

    const ADMIN: &[Role] = &[Role::Administrator];
    const TEACHER: &[Role] = &[Role::Teacher];
    const STAFF: &[Role] = &[Role::Administrator, Role::Teacher];
    const EVERYONE: &[Role] = &Role::ALL;

    let table: &[(&str, &[&str], &[Role])] = &[
        (ADMINISTRATORS, &[CREATE, LIST], ADMIN),
        (TEACHERS, &[CREATE, DELETE, LIST], ADMIN),
        (STUDENTS, &[CREATE, DELETE], ADMIN),
        (STUDENTS, &[LIST], STAFF),
        (PARENTS, &[CREATE, DELETE, LIST], ADMIN),
        (CLASSES, &[LIST, MEMBERS], STAFF),
        (PROFILES, &[READ], ADMIN),
        (SUBJECTS, &[LIST, REGISTER], TEACHER),
        (GRADES, &[WRITE], TEACHER),
        (GRADES, &[READ], &[Role::Teacher, Role::Student, Role::Parent]),
        (NEWS, &[CREATE, DELETE, UPDATE], ADMIN),
        (NEWS, &[READ], EVERYONE),
        (PASSWORDS, &[UPDATE], EVERYONE),
        (RULES, &[LIST], ADMIN),
    ];

    table
        .iter()
        .flat_map(|(resource, ops, roles)| {
            ops.iter()
                .map(move |operation| AccessRule::new(resource, operation, roles))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rules_are_valid() {
        let rules = default_rules();
        assert!(!rules.is_empty());
        for rule in &rules {
            rule.validate().expect("rule");
        }
    }

    #[test]
    fn grades_write_is_teacher_only() {
        let rules = default_rules();
        let rule = rules
            .iter()
            .find(|rule| rule.resource == resources::GRADES && rule.operation == operations::WRITE)
            .expect("grades:write");
        assert_eq!(rule.roles, vec![Role::Teacher]);
    }

    #[test]
    fn rule_without_roles_is_rejected() {
        let rule = AccessRule::new(resources::NEWS, operations::READ, &[]);
        assert!(matches!(rule.validate(), Err(AuthzError::InvalidRule(_))));
        let rule = AccessRule::new(" ", operations::READ, &[Role::Parent]);
        assert!(rule.validate().is_err());
    }

    #[test]
    fn rule_file_parses_from_json() {
        let raw = r#"{"rules":[{"resource":"news","operation":"*","roles":["administrator"]}]}"#;
        let file: AccessRuleFile = serde_json::from_str(raw).expect("parse");
        assert_eq!(file.rules[0].operation, operations::ANY);
        assert_eq!(file.rules[0].roles, vec![Role::Administrator]);
    }
}
