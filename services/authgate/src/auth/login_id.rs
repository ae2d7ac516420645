//! Login identifiers.
//!
//! Staff and students sign in with a registration number whose prefix names
//! the role (`ADM001`, `TCH26001`, `STU26007`). Parents sign in with their
//! e-mail address, stored lowercased.
use schoolgate_authz::Role;

const ADMINISTRATOR_PREFIX: &str = "ADM";
const TEACHER_PREFIX: &str = "TCH";
const STUDENT_PREFIX: &str = "STU";

/// Role implied by the shape of a login identifier.
///
/// Anything containing `@` is a parent e-mail, whatever its first letters;
/// registration numbers never contain `@`.
pub fn role_for_login_id(login_id: &str) -> Role {
    if login_id.contains('@') {
        Role::Parent
    } else if login_id.starts_with(ADMINISTRATOR_PREFIX) {
        Role::Administrator
    } else if login_id.starts_with(STUDENT_PREFIX) {
        Role::Student
    } else if login_id.starts_with(TEACHER_PREFIX) {
        Role::Teacher
    } else {
        Role::Parent
    }
}

/// Build the identifier for the `sequence`-th account of `role`.
///
/// `year` is only used for teachers and students (two digits, modulo 100).
pub fn format_login_id(role: Role, sequence: u32, year: i32, email: &str) -> String {
    let yy = year.rem_euclid(100);
    match role {
        Role::Administrator => format!("{ADMINISTRATOR_PREFIX}{sequence:03}"),
        Role::Teacher => format!("{TEACHER_PREFIX}{yy:02}{sequence:03}"),
        Role::Student => format!("{STUDENT_PREFIX}{yy:02}{sequence:03}"),
        Role::Parent => normalize_email(email),
    }
}

/// Canonical form of a user-supplied identifier; e-mail identifiers are case-insensitive.
pub fn normalize_login_id(login_id: &str) -> String {
    let trimmed = login_id.trim();
    match role_for_login_id(trimmed) {
        Role::Parent => normalize_email(trimmed),
        _ => trimmed.to_string(),
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn looks_like_email(value: &str) -> bool {
    match value.trim().split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_select_roles() {
        assert_eq!(role_for_login_id("ADM001"), Role::Administrator);
        assert_eq!(role_for_login_id("TCH26001"), Role::Teacher);
        assert_eq!(role_for_login_id("STU26014"), Role::Student);
        assert_eq!(role_for_login_id("ada@example.com"), Role::Parent);
        assert_eq!(role_for_login_id("adm001"), Role::Parent);
    }

    #[test]
    fn registration_numbers_are_padded() {
        assert_eq!(format_login_id(Role::Administrator, 1, 2026, ""), "ADM001");
        assert_eq!(format_login_id(Role::Teacher, 12, 2026, ""), "TCH26012");
        assert_eq!(format_login_id(Role::Student, 7, 2009, ""), "STU09007");
        assert_eq!(format_login_id(Role::Student, 1234, 2026, ""), "STU261234");
    }

    #[test]
    fn parent_ids_are_lowercased_emails() {
        assert_eq!(
            format_login_id(Role::Parent, 3, 2026, " Ada@Example.COM "),
            "ada@example.com"
        );
        assert_eq!(normalize_login_id("Ada@Example.com"), "ada@example.com");
        assert_eq!(normalize_login_id(" TCH26001 "), "TCH26001");
    }

    #[test]
    fn emails_starting_with_a_role_prefix_stay_parents() {
        for login in [
            "STUART@HOME.EXAMPLE",
            "Stuart@Home.example",
            "ADMIN@school.example",
            "TCHAIKOVSKY@music.example",
        ] {
            assert_eq!(role_for_login_id(login), Role::Parent, "{login}");
        }
        assert_eq!(normalize_login_id("STUART@HOME.EXAMPLE"), "stuart@home.example");
        assert_eq!(normalize_login_id(" ADMIN@School.Example "), "admin@school.example");
    }

    #[test]
    fn email_shape_check() {
        assert!(looks_like_email("ada@example.com"));
        assert!(!looks_like_email("ada"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("ada@localhost"));
        assert!(!looks_like_email("ada@example."));
    }
}
