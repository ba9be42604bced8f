use rusqlite::{params, OptionalExtension, Row};

use crate::db::models::Post;
use crate::error::AppResult;
use crate::services::{page_offset, ITEMS_PER_PAGE};
use crate::state::DbPool;

pub trait PostService {
    fn create(&self, author_id: i64, title: &str, content: &str) -> AppResult<Post>;
    fn get(&self, id: i64) -> AppResult<Option<Post>>;
    fn list(&self, page: u32) -> AppResult<Vec<Post>>;
    fn edit(&self, id: i64, title: Option<&str>, content: Option<&str>) -> AppResult<()>;
    fn delete(&self, id: i64) -> AppResult<()>;
}

pub struct SqlitePostService {
    pool: DbPool,
}

impl SqlitePostService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_post(row: &Row) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        author_id: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

const POST_COLUMNS: &str = "id, author_id, title, content, created_at, updated_at";

impl PostService for SqlitePostService {
    fn create(&self, author_id: i64, title: &str, content: &str) -> AppResult<Post> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO posts (author_id, title, content) VALUES (?1, ?2, ?3)",
            params![author_id, title, content],
        )?;
        let id = conn.last_insert_rowid();

        let post = conn.query_row(
            &format!("SELECT {} FROM posts WHERE id = ?1", POST_COLUMNS),
            params![id],
            row_to_post,
        )?;
        Ok(post)
    }

    fn get(&self, id: i64) -> AppResult<Option<Post>> {
        let conn = self.pool.get()?;
        let post = conn
            .query_row(
                &format!("SELECT {} FROM posts WHERE id = ?1", POST_COLUMNS),
                params![id],
                row_to_post,
            )
            .optional()?;
        Ok(post)
    }

    fn list(&self, page: u32) -> AppResult<Vec<Post>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM posts ORDER BY id DESC LIMIT ?1 OFFSET ?2",
            POST_COLUMNS
        ))?;
        let posts = stmt
            .query_map(params![ITEMS_PER_PAGE, page_offset(page)], row_to_post)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    // Single statement; either both fields land or neither does
    fn edit(&self, id: i64, title: Option<&str>, content: Option<&str>) -> AppResult<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "UPDATE posts SET title = COALESCE(?2, title), content = COALESCE(?3, content), \
             updated_at = datetime('now') WHERE id = ?1",
            params![id, title, content],
        )?;
        Ok(())
    }

    fn delete(&self, id: i64) -> AppResult<()> {
        let conn = self.pool.get()?;
        conn.execute("DELETE FROM posts WHERE id = ?1", params![id])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use r2d2::Pool;
    use r2d2_sqlite::SqliteConnectionManager;
    use rusqlite::params;

    fn test_service() -> SqlitePostService {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager).unwrap();
        crate::db::run_migrations(&pool).unwrap();
        let conn = pool.get().unwrap();
        conn.execute(
            "INSERT INTO users (nickname, password_hash) VALUES ('alice', 'x')",
            params![],
        )
        .unwrap();
        SqlitePostService::new(pool)
    }

    #[test]
    fn create_and_get_round_trip() {
        let service = test_service();
        let post = service.create(1, "hello", "first post").unwrap();

        let found = service.get(post.id).unwrap().unwrap();
        assert_eq!(found.title, "hello");
        assert_eq!(found.content, "first post");
        assert_eq!(found.author_id, 1);
    }

    #[test]
    fn get_missing_post_is_none() {
        let service = test_service();
        assert!(service.get(42).unwrap().is_none());
    }

    #[test]
    fn edit_updates_only_provided_fields() {
        let service = test_service();
        let post = service.create(1, "hello", "first post").unwrap();

        service.edit(post.id, None, Some("revised")).unwrap();

        let found = service.get(post.id).unwrap().unwrap();
        assert_eq!(found.title, "hello");
        assert_eq!(found.content, "revised");
    }

    #[test]
    fn delete_removes_the_post() {
        let service = test_service();
        let post = service.create(1, "hello", "first post").unwrap();
        service.delete(post.id).unwrap();
        assert!(service.get(post.id).unwrap().is_none());
    }

    #[test]
    fn list_paginates() {
        let service = test_service();
        for i in 0..25 {
            service.create(1, &format!("post {}", i), "body").unwrap();
        }
        assert_eq!(service.list(1).unwrap().len(), 20);
        assert_eq!(service.list(2).unwrap().len(), 5);
        assert!(service.list(3).unwrap().is_empty());
    }
}
