//! Who may do what.
//!
//! Role branching lives here rather than in handlers: every operation asks one of these
//! functions before touching the store.

use serde::Serialize;

use crate::{
    error::{AppError, AppResult},
    models::Role,
};

/// The authenticated caller, as supplied by the identity service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Caller {
    pub id: String,
    pub role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    Deny,
}

/// Decides whether `caller_id` acting as `role` may read a resource owned by `owner_id`.
///
/// Students see only their own resources; faculty and admins see everyone's.
pub fn check(role: Role, caller_id: &str, owner_id: &str) -> Access {
    match role {
        Role::Student if caller_id == owner_id => Access::Allow,
        Role::Student => Access::Deny,
        Role::Faculty | Role::Admin => Access::Allow,
    }
}

impl Caller {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }

    /// Fails with [`AppError::AccessDenied`] unless the caller holds one of `roles`.
    pub fn require(&self, roles: &[Role]) -> AppResult<()> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(AppError::AccessDenied(format!(
                "role '{}' may not perform this operation",
                self.role
            )))
        }
    }

    /// Fails with [`AppError::AccessDenied`] when [`check`] denies access to `owner_id`.
    pub fn require_access(&self, owner_id: &str) -> AppResult<()> {
        match check(self.role, &self.id, owner_id) {
            Access::Allow => Ok(()),
            Access::Deny => Err(AppError::AccessDenied(format!(
                "'{}' may not view records of '{owner_id}'",
                self.id
            ))),
        }
    }

    /// The faculty filter a report query actually runs with.
    ///
    /// Faculty members are pinned to their own sessions whatever they asked for; admins keep
    /// their requested filter; students may not run reports.
    pub fn report_scope(&self, requested: Option<String>) -> AppResult<Option<String>> {
        match self.role {
            Role::Faculty => Ok(Some(self.id.clone())),
            Role::Admin => Ok(requested),
            Role::Student => Err(AppError::AccessDenied(
                "students may not run attendance reports".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn students_only_see_themselves() {
        assert_eq!(check(Role::Student, "stu1", "stu1"), Access::Allow);
        assert_eq!(check(Role::Student, "stu1", "stu2"), Access::Deny);
    }

    #[test]
    fn staff_see_everyone() {
        assert_eq!(check(Role::Faculty, "fac1", "stu2"), Access::Allow);
        assert_eq!(check(Role::Admin, "adm1", "stu2"), Access::Allow);
    }

    #[test]
    fn require_role() {
        let caller = Caller::new("stu1", Role::Student);
        assert!(matches!(
            caller.require(&[Role::Faculty]),
            Err(AppError::AccessDenied(_))
        ));
        assert!(caller.require(&[Role::Student, Role::Admin]).is_ok());
    }

    #[test]
    fn faculty_report_scope_is_forced() {
        let caller = Caller::new("fac1", Role::Faculty);
        let scope = caller.report_scope(Some("fac2".to_string())).unwrap();
        assert_eq!(scope.as_deref(), Some("fac1"));
    }

    #[test]
    fn admin_report_scope_passes_through() {
        let caller = Caller::new("adm1", Role::Admin);
        assert_eq!(caller.report_scope(None).unwrap(), None);
        assert_eq!(
            caller.report_scope(Some("fac2".to_string())).unwrap().as_deref(),
            Some("fac2")
        );
    }

    #[test]
    fn student_report_scope_is_denied() {
        let caller = Caller::new("stu1", Role::Student);
        assert!(caller.report_scope(None).is_err());
    }
}
