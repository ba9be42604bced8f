use rusqlite::{params, OptionalExtension, Row};

use crate::db::models::Comment;
use crate::error::AppResult;
use crate::services::{page_offset, ITEMS_PER_PAGE};
use crate::state::DbPool;

pub trait CommentService {
    fn create(&self, author_id: i64, post_id: i64, content: &str) -> AppResult<Comment>;
    fn get(&self, id: i64) -> AppResult<Option<Comment>>;
    fn list_all(&self, page: u32) -> AppResult<Vec<Comment>>;
    fn list_by_post(&self, post_id: i64, page: u32) -> AppResult<Vec<Comment>>;
    fn list_by_author(&self, author_id: i64, page: u32) -> AppResult<Vec<Comment>>;
    fn list_by_post_and_author(
        &self,
        post_id: i64,
        author_id: i64,
        page: u32,
    ) -> AppResult<Vec<Comment>>;
    fn edit(&self, id: i64, content: &str) -> AppResult<()>;
    fn delete(&self, id: i64) -> AppResult<()>;
}

pub struct SqliteCommentService {
    pool: DbPool,
}

impl SqliteCommentService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_comment(row: &Row) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        author_id: row.get(1)?,
        post_id: row.get(2)?,
        content: row.get(3)?,
        created_at: row.get(4)?,
    })
}

const COMMENT_COLUMNS: &str = "id, author_id, post_id, content, created_at";

impl CommentService for SqliteCommentService {
    fn create(&self, author_id: i64, post_id: i64, content: &str) -> AppResult<Comment> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO comments (author_id, post_id, content) VALUES (?1, ?2, ?3)",
            params![author_id, post_id, content],
        )?;
        let id = conn.last_insert_rowid();

        let comment = conn.query_row(
            &format!("SELECT {} FROM comments WHERE id = ?1", COMMENT_COLUMNS),
            params![id],
            row_to_comment,
        )?;
        Ok(comment)
    }

    fn get(&self, id: i64) -> AppResult<Option<Comment>> {
        let conn = self.pool.get()?;
        let comment = conn
            .query_row(
                &format!("SELECT {} FROM comments WHERE id = ?1", COMMENT_COLUMNS),
                params![id],
                row_to_comment,
            )
            .optional()?;
        Ok(comment)
    }

    fn list_all(&self, page: u32) -> AppResult<Vec<Comment>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM comments ORDER BY id LIMIT ?1 OFFSET ?2",
            COMMENT_COLUMNS
        ))?;
        let comments = stmt
            .query_map(params![ITEMS_PER_PAGE, page_offset(page)], row_to_comment)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(comments)
    }

    fn list_by_post(&self, post_id: i64, page: u32) -> AppResult<Vec<Comment>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM comments WHERE post_id = ?1 ORDER BY id LIMIT ?2 OFFSET ?3",
            COMMENT_COLUMNS
        ))?;
        let comments = stmt
            .query_map(
                params![post_id, ITEMS_PER_PAGE, page_offset(page)],
                row_to_comment,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(comments)
    }

    fn list_by_author(&self, author_id: i64, page: u32) -> AppResult<Vec<Comment>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM comments WHERE author_id = ?1 ORDER BY id LIMIT ?2 OFFSET ?3",
            COMMENT_COLUMNS
        ))?;
        let comments = stmt
            .query_map(
                params![author_id, ITEMS_PER_PAGE, page_offset(page)],
                row_to_comment,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(comments)
    }

    fn list_by_post_and_author(
        &self,
        post_id: i64,
        author_id: i64,
        page: u32,
    ) -> AppResult<Vec<Comment>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM comments WHERE post_id = ?1 AND author_id = ?2 \
             ORDER BY id LIMIT ?3 OFFSET ?4",
            COMMENT_COLUMNS
        ))?;
        let comments = stmt
            .query_map(
                params![post_id, author_id, ITEMS_PER_PAGE, page_offset(page)],
                row_to_comment,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(comments)
    }

    fn edit(&self, id: i64, content: &str) -> AppResult<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "UPDATE comments SET content = ?2 WHERE id = ?1",
            params![id, content],
        )?;
        Ok(())
    }

    fn delete(&self, id: i64) -> AppResult<()> {
        let conn = self.pool.get()?;
        conn.execute("DELETE FROM comments WHERE id = ?1", params![id])?;
        Ok(())
    }
}
