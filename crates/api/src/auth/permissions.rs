use crate::auth::Claims;
use crate::error::AppError;

/// Role extracted from the JWT `role` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Instructor,
    Student,
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "ADMIN" => Role::Admin,
            "INSTRUCTOR" => Role::Instructor,
            _ => Role::Student,
        }
    }
}

fn satisfies(user_role: Role, required: Role) -> bool {
    match required {
        Role::Admin => user_role == Role::Admin,
        Role::Instructor => matches!(user_role, Role::Instructor | Role::Admin),
        Role::Student => true,
    }
}

/// Enforced at handler entry (spec.md §6.2's "enforce role gate at handler
/// entry"); `claims` comes from the request extensions populated by
/// `jwt_middleware`.
pub fn require_role(claims: Option<&Claims>, required: Role) -> Result<&Claims, AppError> {
    let claims = claims.ok_or_else(|| AppError::Unauthorized("missing bearer token".into()))?;
    let role = Role::from(claims.role.as_str());
    if !satisfies(role, required) {
        return Err(AppError::Unauthorized(format!(
            "requires {:?} role, caller has {:?}",
            required, role
        )));
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_satisfies_every_gate() {
        assert!(satisfies(Role::Admin, Role::Admin));
        assert!(satisfies(Role::Admin, Role::Instructor));
        assert!(satisfies(Role::Admin, Role::Student));
    }

    #[test]
    fn student_does_not_satisfy_instructor_gate() {
        assert!(!satisfies(Role::Student, Role::Instructor));
        assert!(!satisfies(Role::Student, Role::Admin));
    }
}
