use super::principal::{Principal, Role};
use crate::error::{AppError, AppResult};

/// The one role decision every protected entry point goes through.
///
/// `None` means any authenticated identity is enough. Roles are matched exactly:
/// a route that requires `user` does not admit `admin` and vice versa.
pub fn check_role(principal: &Principal, required: Option<Role>) -> AppResult<()> {
    match required {
        None => Ok(()),
        Some(role) if principal.role == role => Ok(()),
        Some(_) => Err(AppError::forbidden()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(role: Role) -> Principal { Principal { user_id: "x".into(), role } }

    #[test]
    fn decisions() {
        assert!(check_role(&p(Role::User), None).is_ok());
        assert!(check_role(&p(Role::Admin), None).is_ok());
        assert!(check_role(&p(Role::Admin), Some(Role::Admin)).is_ok());
        assert_eq!(check_role(&p(Role::User), Some(Role::Admin)).unwrap_err().http_status(), 403);
        assert_eq!(check_role(&p(Role::Admin), Some(Role::User)).unwrap_err().http_status(), 403);
    }
}
