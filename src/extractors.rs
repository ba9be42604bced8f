use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::auth::session::{resolve_session, SessionContent};
use crate::error::AppError;
use crate::state::AppState;

/// Extractor that requires an authenticated session. Rejects with 401,
/// distinguishing missing cookie, unknown session, and expired session.
impl FromRequestParts<AppState> for SessionContent {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let cookie = cookie_value(&parts.headers, &state.config.auth.cookie_name);
        resolve_session(&state.db, cookie)
    }
}

/// Find a cookie by name in the request headers.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|cookie| {
            let mut split = cookie.splitn(2, '=');
            let key = split.next()?.trim();
            let val = split.next()?.trim();
            if key == name {
                Some(val)
            } else {
                None
            }
        })
}
