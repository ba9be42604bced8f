use rusqlite::{params, OptionalExtension, Row};

use crate::auth::password;
use crate::db::models::{Role, User};
use crate::error::{AppError, AppResult};
use crate::state::DbPool;

/// Account operations. One storage-backed implementation; the trait
/// allows an in-memory fake in tests.
pub trait UserService {
    fn signup(&self, nickname: &str, plain_password: &str) -> AppResult<User>;
    fn find_by_nickname(&self, nickname: &str) -> AppResult<Option<User>>;
    fn find_by_id(&self, id: i64) -> AppResult<Option<User>>;
}

pub struct SqliteUserService {
    pool: DbPool,
}

impl SqliteUserService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_user(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        nickname: row.get(1)?,
        password_hash: row.get(2)?,
        role: Role::parse(&row.get::<_, String>(3)?),
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

const USER_COLUMNS: &str = "id, nickname, password_hash, role, created_at, updated_at";

impl UserService for SqliteUserService {
    fn signup(&self, nickname: &str, plain_password: &str) -> AppResult<User> {
        if self.find_by_nickname(nickname)?.is_some() {
            return Err(AppError::Conflict("nickname already taken".into()));
        }

        let hashed = password::hash(plain_password)
            .map_err(|e| AppError::Internal(format!("password hashing failed: {}", e)))?;

        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO users (nickname, password_hash) VALUES (?1, ?2)",
            params![nickname, hashed],
        )
        .map_err(|e| {
            // The unique constraint backstops the pre-check under
            // concurrent signups
            if e.sqlite_error_code() == Some(rusqlite::ErrorCode::ConstraintViolation) {
                AppError::Conflict("nickname already taken".into())
            } else {
                AppError::Database(e)
            }
        })?;

        let id = conn.last_insert_rowid();
        drop(conn);

        self.find_by_id(id)?
            .ok_or_else(|| AppError::Internal("signup row vanished after insert".into()))
    }

    fn find_by_nickname(&self, nickname: &str) -> AppResult<Option<User>> {
        let conn = self.pool.get()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE nickname = ?1", USER_COLUMNS),
                params![nickname],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
        let conn = self.pool.get()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
                params![id],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use r2d2::Pool;
    use r2d2_sqlite::SqliteConnectionManager;

    fn test_service() -> SqliteUserService {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager).unwrap();
        crate::db::run_migrations(&pool).unwrap();
        SqliteUserService::new(pool)
    }

    #[test]
    fn signup_assigns_id_and_hashes_password() {
        let service = test_service();
        let user = service.signup("alice", "Abcdefgh").unwrap();

        assert_eq!(user.id, 1);
        assert_eq!(user.nickname, "alice");
        assert_eq!(user.role, Role::Member);
        assert_ne!(user.password_hash, "Abcdefgh");
        assert!(password::verify("Abcdefgh", &user.password_hash));
    }

    #[test]
    fn duplicate_nickname_is_a_conflict() {
        let service = test_service();
        service.signup("alice", "Abcdefgh").unwrap();

        let err = service.signup("alice", "Zyxwvuts").unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn find_by_nickname_misses_cleanly() {
        let service = test_service();
        assert!(service.find_by_nickname("nobody").unwrap().is_none());
    }
}
