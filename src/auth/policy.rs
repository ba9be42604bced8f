use crate::auth::session::SessionContent;
use crate::db::models::Role;
use crate::error::{AppError, AppResult};

/// Authorization predicate for mutating an owned resource: the acting
/// identity must be the owner or an admin.
pub fn may_modify(identity: &SessionContent, owner_id: i64) -> bool {
    identity.role == Role::Admin || identity.user_id == owner_id
}

/// Enforce the predicate, producing a Forbidden error naming the action.
/// Callers must have already checked that the target exists, so a
/// missing resource reports not-found rather than forbidden.
pub fn ensure_may_modify(identity: &SessionContent, owner_id: i64, action: &str) -> AppResult<()> {
    if may_modify(identity, owner_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "only the author or an admin may {} this",
            action
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn identity(user_id: i64, role: Role) -> SessionContent {
        SessionContent {
            user_id,
            role,
            expire: Utc::now() + Duration::hours(1),
        }
    }

    #[test]
    fn owner_may_modify_own_resource() {
        assert!(may_modify(&identity(1, Role::Member), 1));
    }

    #[test]
    fn non_owner_member_may_not_modify() {
        assert!(!may_modify(&identity(2, Role::Member), 1));
    }

    #[test]
    fn admin_may_modify_any_resource() {
        assert!(may_modify(&identity(2, Role::Admin), 1));
    }

    // If a non-admin owner is authorized, an admin is authorized for the
    // same resource regardless of ownership.
    #[test]
    fn authorization_is_monotonic_in_role() {
        for owner_id in [1, 2, 99] {
            let member = identity(owner_id, Role::Member);
            if may_modify(&member, owner_id) {
                assert!(may_modify(&identity(12345, Role::Admin), owner_id));
            }
        }
    }

    #[test]
    fn ensure_names_the_action_in_the_error() {
        let err = ensure_may_modify(&identity(2, Role::Member), 1, "edit").unwrap_err();
        match err {
            AppError::Forbidden(msg) => assert!(msg.contains("edit")),
            other => panic!("expected Forbidden, got {:?}", other),
        }
    }
}
