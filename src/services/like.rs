use rusqlite::{params, OptionalExtension, Row};

use crate::db::models::{Like, Role, User};
use crate::error::{AppError, AppResult};
use crate::state::DbPool;

pub trait LikeService {
    fn create_like(&self, user_id: i64, post_id: i64) -> AppResult<Like>;
    fn find(&self, user_id: i64, post_id: i64) -> AppResult<Option<Like>>;
    /// Users who liked the given post, or who liked anything when
    /// `post_id` is None. Unordered.
    fn list_likers(&self, post_id: Option<i64>) -> AppResult<Vec<User>>;
}

pub struct SqliteLikeService {
    pool: DbPool,
}

impl SqliteLikeService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_like(row: &Row) -> rusqlite::Result<Like> {
    Ok(Like {
        id: row.get(0)?,
        user_id: row.get(1)?,
        post_id: row.get(2)?,
        created_at: row.get(3)?,
    })
}

impl LikeService for SqliteLikeService {
    fn create_like(&self, user_id: i64, post_id: i64) -> AppResult<Like> {
        if self.find(user_id, post_id)?.is_some() {
            return Err(AppError::Conflict("already liked this post".into()));
        }

        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO likes (user_id, post_id) VALUES (?1, ?2)",
            params![user_id, post_id],
        )
        .map_err(|e| {
            // The unique constraint backstops the pre-check under
            // concurrent requests
            if e.sqlite_error_code() == Some(rusqlite::ErrorCode::ConstraintViolation) {
                AppError::Conflict("already liked this post".into())
            } else {
                AppError::Database(e)
            }
        })?;
        let id = conn.last_insert_rowid();

        let like = conn.query_row(
            "SELECT id, user_id, post_id, created_at FROM likes WHERE id = ?1",
            params![id],
            row_to_like,
        )?;
        Ok(like)
    }

    fn find(&self, user_id: i64, post_id: i64) -> AppResult<Option<Like>> {
        let conn = self.pool.get()?;
        let like = conn
            .query_row(
                "SELECT id, user_id, post_id, created_at FROM likes \
                 WHERE user_id = ?1 AND post_id = ?2",
                params![user_id, post_id],
                row_to_like,
            )
            .optional()?;
        Ok(like)
    }

    fn list_likers(&self, post_id: Option<i64>) -> AppResult<Vec<User>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT DISTINCT u.id, u.nickname, u.password_hash, u.role, u.created_at, u.updated_at \
             FROM users u JOIN likes l ON l.user_id = u.id \
             WHERE ?1 IS NULL OR l.post_id = ?1",
        )?;
        let users = stmt
            .query_map(params![post_id], |row| {
                Ok(User {
                    id: row.get(0)?,
                    nickname: row.get(1)?,
                    password_hash: row.get(2)?,
                    role: Role::parse(&row.get::<_, String>(3)?),
                    created_at: row.get(4)?,
                    updated_at: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }
}
