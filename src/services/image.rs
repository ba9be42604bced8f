use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use crate::db::models::{Image, ImageState};
use crate::error::{AppError, AppResult};
use crate::state::DbPool;

pub trait ImageService {
    fn save_profile_image(
        &self,
        user_id: i64,
        original_name: &str,
        bytes: &[u8],
    ) -> AppResult<Image>;
    fn remove_stale_pending(&self, cutoff: DateTime<Utc>) -> AppResult<CleanupReport>;
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: usize,
    pub failed: usize,
}

/// Stores profile images on local disk; rows track which file is the
/// user's current image.
pub struct SqliteImageService {
    pool: DbPool,
    uploads_dir: PathBuf,
}

impl SqliteImageService {
    pub fn new(pool: DbPool, uploads_dir: PathBuf) -> Self {
        Self { pool, uploads_dir }
    }

    fn image_path(&self, name: &str) -> PathBuf {
        self.uploads_dir.join(name)
    }

    /// Demote the previous active image and try to remove its file.
    /// Best-effort: a failure here is logged and the upload still
    /// succeeds; the pending row is left for the cleanup sweep.
    fn retire_previous(&self, prev: &Image) {
        let conn = match self.pool.get() {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!("Could not retire previous image {}: {}", prev.id, e);
                return;
            }
        };

        if let Err(e) = conn.execute(
            "UPDATE images SET state = 'pending' WHERE id = ?1",
            params![prev.id],
        ) {
            tracing::warn!("Could not retire previous image {}: {}", prev.id, e);
            return;
        }

        if let Err(e) = remove_file_if_present(&self.image_path(&prev.name)) {
            tracing::warn!("Could not remove previous image file {}: {}", prev.name, e);
        }
    }
}

fn row_to_image(row: &Row) -> rusqlite::Result<Image> {
    Ok(Image {
        id: row.get(0)?,
        name: row.get(1)?,
        user_id: row.get(2)?,
        state: ImageState::parse(&row.get::<_, String>(3)?),
        created_at: row.get(4)?,
    })
}

fn remove_file_if_present(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

const IMAGE_COLUMNS: &str = "id, name, user_id, state, created_at";

impl ImageService for SqliteImageService {
    fn save_profile_image(
        &self,
        user_id: i64,
        original_name: &str,
        bytes: &[u8],
    ) -> AppResult<Image> {
        let mime = mime_guess::from_path(original_name).first_or_octet_stream();
        if mime.type_() != mime_guess::mime::IMAGE {
            return Err(AppError::Validation(
                "only image uploads are accepted".into(),
            ));
        }

        let ext = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("bin");
        let name = format!("{}.{}", uuid::Uuid::now_v7(), ext);

        std::fs::create_dir_all(&self.uploads_dir)
            .and_then(|_| std::fs::write(self.image_path(&name), bytes))
            .map_err(|e| AppError::Internal(format!("image write failed: {}", e)))?;

        let prev = {
            let conn = self.pool.get()?;
            conn.query_row(
                &format!(
                    "SELECT {} FROM images WHERE user_id = ?1 AND state = 'active'",
                    IMAGE_COLUMNS
                ),
                params![user_id],
                row_to_image,
            )
            .optional()?
        };

        let image = {
            let conn = self.pool.get()?;
            conn.execute(
                "INSERT INTO images (name, user_id, state) VALUES (?1, ?2, 'active')",
                params![name, user_id],
            )?;
            let id = conn.last_insert_rowid();
            conn.query_row(
                &format!("SELECT {} FROM images WHERE id = ?1", IMAGE_COLUMNS),
                params![id],
                row_to_image,
            )?
        };

        if let Some(prev) = prev {
            self.retire_previous(&prev);
        }

        Ok(image)
    }

    /// Best-effort sweep of pending images older than the cutoff.
    /// Individual failures are logged and counted, never abort the
    /// sweep.
    fn remove_stale_pending(&self, cutoff: DateTime<Utc>) -> AppResult<CleanupReport> {
        let conn = self.pool.get()?;

        let stale: Vec<(i64, String)> = {
            let mut stmt = conn.prepare(
                "SELECT id, name FROM images WHERE state = 'pending' AND created_at < ?1",
            )?;
            let rows = stmt.query_map(
                params![cutoff.format("%Y-%m-%d %H:%M:%S").to_string()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            rows.filter_map(|r| r.ok()).collect()
        };

        let mut report = CleanupReport::default();
        for (id, name) in stale {
            let file_removed = remove_file_if_present(&self.image_path(&name));
            let row_removed = conn.execute("DELETE FROM images WHERE id = ?1", params![id]);

            match (file_removed, row_removed) {
                (Ok(()), Ok(_)) => report.removed += 1,
                (file, row) => {
                    if let Err(e) = file {
                        tracing::warn!("Could not remove image file {}: {}", name, e);
                    }
                    if let Err(e) = row {
                        tracing::warn!("Could not remove image row {}: {}", id, e);
                    }
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}
