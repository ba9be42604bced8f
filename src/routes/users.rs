use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::auth::{password, session};
use crate::error::{AppError, AppResult};
use crate::extractors::cookie_value;
use crate::services::user::{SqliteUserService, UserService};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", post(signup))
        .route("/users/login", post(login))
        .route("/users/logout", post(logout))
}

#[derive(Deserialize)]
struct SignupRequest {
    nickname: String,
    password: String,
}

#[derive(Serialize)]
struct SignupResponse {
    id: i64,
    nickname: String,
}

#[derive(Deserialize)]
struct LoginRequest {
    nickname: String,
    password: String,
}

#[derive(Serialize)]
struct LoginResponse {
    session_id: String,
}

// -- Cookie helpers --

fn session_cookie(name: &str, token: &str, max_age_hours: u64) -> String {
    let max_age_secs = max_age_hours * 3600;
    format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}",
        name, token, max_age_secs
    )
}

fn clear_session_cookie(name: &str) -> String {
    format!("{}=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0", name)
}

/// Passwords must be at least 8 characters with at least one uppercase
/// letter.
fn validate_signup(req: &SignupRequest) -> AppResult<()> {
    if req.nickname.trim().is_empty() {
        return Err(AppError::Validation("nickname must not be empty".into()));
    }
    if req.password.len() < 8 {
        return Err(AppError::Validation(
            "password must be at least 8 characters".into(),
        ));
    }
    if !req.password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(AppError::Validation(
            "password must contain at least one uppercase letter".into(),
        ));
    }
    Ok(())
}

/// POST /users — create an account
async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> AppResult<impl IntoResponse> {
    validate_signup(&req)?;

    let service = SqliteUserService::new(state.db.clone());
    let user = service.signup(&req.nickname, &req.password)?;

    tracing::info!("New signup: {} (id {})", user.nickname, user.id);
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            id: user.id,
            nickname: user.nickname,
        }),
    ))
}

/// POST /users/login — verify credentials, create a session, set the
/// session cookie. Unknown user and wrong password are reported
/// distinctly, both as 401.
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let service = SqliteUserService::new(state.db.clone());
    let user = service
        .find_by_nickname(&req.nickname)?
        .ok_or_else(|| AppError::Unauthenticated("unknown user".into()))?;

    if !password::verify(&req.password, &user.password_hash) {
        return Err(AppError::Unauthenticated("wrong password".into()));
    }

    let ttl = Duration::hours(state.config.auth.session_hours as i64);
    let token = session::create_session(&state.db, user.id, user.role, ttl)?;

    let cookie = session_cookie(
        &state.config.auth.cookie_name,
        &token,
        state.config.auth.session_hours,
    );
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse { session_id: token }),
    ))
}

/// POST /users/logout — delete the session and clear the cookie. An
/// unknown session token reports not-found; deleting twice is handled
/// by the store being idempotent, the lookup here is what rejects.
async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<impl IntoResponse> {
    let token = cookie_value(&headers, &state.config.auth.cookie_name)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthenticated(session::MISSING_COOKIE.into()))?;

    session::find_session(&state.db, token)?
        .ok_or_else(|| AppError::NotFound("unknown session".into()))?;

    session::delete_session(&state.db, token)?;

    Ok((
        StatusCode::OK,
        [(
            header::SET_COOKIE,
            clear_session_cookie(&state.config.auth.cookie_name),
        )],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(nickname: &str, password: &str) -> SignupRequest {
        SignupRequest {
            nickname: nickname.into(),
            password: password.into(),
        }
    }

    #[test]
    fn valid_signup_passes() {
        assert!(validate_signup(&request("alice", "Abcdefgh")).is_ok());
    }

    #[test]
    fn empty_nickname_fails() {
        assert!(matches!(
            validate_signup(&request("  ", "Abcdefgh")),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn short_password_fails() {
        assert!(matches!(
            validate_signup(&request("alice", "Abc")),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn password_without_uppercase_fails() {
        assert!(matches!(
            validate_signup(&request("alice", "abcdefgh")),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn session_cookie_is_http_only_with_max_age() {
        let cookie = session_cookie("session_id", "abc", 24);
        assert!(cookie.starts_with("session_id=abc;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=86400"));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let cookie = clear_session_cookie("session_id");
        assert!(cookie.contains("Max-Age=0"));
    }
}
