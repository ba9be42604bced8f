use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::db::models::Role;
use crate::error::{AppError, AppResult};
use crate::state::DbPool;

pub const MISSING_COOKIE: &str = "no session cookie; please log in again";
pub const UNKNOWN_SESSION: &str = "unknown session; please log in again";
pub const EXPIRED_SESSION: &str = "expired session; please log in again";

/// The identity resolved from a session token. Immutable value object
/// passed down the call chain; carries no database handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionContent {
    pub user_id: i64,
    pub role: Role,
    pub expire: DateTime<Utc>,
}

/// Create a new session for a user. Returns the opaque session token.
pub fn create_session(pool: &DbPool, user_id: i64, role: Role, ttl: Duration) -> AppResult<String> {
    let conn = pool.get()?;

    let token = generate_token();
    let expire = Utc::now() + ttl;
    let content = SessionContent {
        user_id,
        role,
        expire,
    };

    conn.execute(
        "INSERT INTO sessions (id, content, expires_at) VALUES (?1, ?2, ?3)",
        params![token, serde_json::to_string(&content)?, expire.to_rfc3339()],
    )?;

    Ok(token)
}

/// Look up a session by token without judging expiry.
pub fn find_session(pool: &DbPool, token: &str) -> AppResult<Option<SessionContent>> {
    let conn = pool.get()?;

    let raw: Option<String> = conn
        .query_row(
            "SELECT content FROM sessions WHERE id = ?1",
            params![token],
            |row| row.get(0),
        )
        .optional()?;

    match raw {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}

/// Resolve a session cookie to an identity. The checks run in a fixed
/// order, each short-circuiting: missing cookie, then unknown token,
/// then expiry. An expired session is never reported as unknown while
/// its record still exists.
pub fn resolve_session(pool: &DbPool, cookie: Option<&str>) -> AppResult<SessionContent> {
    let token = match cookie {
        Some(t) if !t.is_empty() => t,
        _ => return Err(AppError::Unauthenticated(MISSING_COOKIE.into())),
    };

    let content = find_session(pool, token)?
        .ok_or_else(|| AppError::Unauthenticated(UNKNOWN_SESSION.into()))?;

    if Utc::now() >= content.expire {
        return Err(AppError::Unauthenticated(EXPIRED_SESSION.into()));
    }

    Ok(content)
}

/// Delete a session by token. Idempotent: deleting an absent token is
/// not an error.
pub fn delete_session(pool: &DbPool, token: &str) -> AppResult<()> {
    let conn = pool.get()?;
    conn.execute("DELETE FROM sessions WHERE id = ?1", params![token])?;
    Ok(())
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReapReport {
    pub reaped: usize,
    pub failed: usize,
}

/// Best-effort sweep of sessions whose expiry predates the cutoff.
/// A failure to delete one record is logged and counted; it never
/// aborts the rest of the sweep.
pub fn reap_expired(pool: &DbPool, cutoff: DateTime<Utc>) -> AppResult<ReapReport> {
    let conn = pool.get()?;

    let expired: Vec<String> = {
        let mut stmt = conn.prepare("SELECT id, expires_at FROM sessions")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        rows.filter_map(|r| r.ok())
            .filter(|(_, expires_at)| {
                DateTime::parse_from_rfc3339(expires_at)
                    .map(|t| t.with_timezone(&Utc) < cutoff)
                    .unwrap_or(true)
            })
            .map(|(id, _)| id)
            .collect()
    };

    let mut report = ReapReport::default();
    for id in expired {
        match conn.execute("DELETE FROM sessions WHERE id = ?1", params![id]) {
            Ok(_) => report.reaped += 1,
            Err(e) => {
                tracing::warn!("Failed to reap session {}: {}", id, e);
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

/// Generate a cryptographically random 32-byte hex token.
fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
