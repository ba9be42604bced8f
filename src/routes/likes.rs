use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::auth::session::SessionContent;
use crate::error::{AppError, AppResult};
use crate::services::like::{LikeService, SqliteLikeService};
use crate::services::post::{PostService, SqlitePostService};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/likes", post(create_like))
        .route("/likes/users", get(list_likers))
}

#[derive(Deserialize)]
struct CreateLikeRequest {
    post_id: i64,
}

#[derive(Deserialize)]
struct LikersQuery {
    post_id: Option<i64>,
}

/// POST /likes — at most one like per (user, post) pair
async fn create_like(
    State(state): State<AppState>,
    identity: SessionContent,
    Json(req): Json<CreateLikeRequest>,
) -> AppResult<impl IntoResponse> {
    SqlitePostService::new(state.db.clone())
        .get(req.post_id)?
        .ok_or_else(|| AppError::NotFound("post not found".into()))?;

    let service = SqliteLikeService::new(state.db.clone());
    let like = service.create_like(identity.user_id, req.post_id)?;
    Ok((StatusCode::CREATED, Json(like)))
}

/// GET /likes/users?post_id= — users who liked the post, or anyone who
/// liked anything when post_id is omitted
async fn list_likers(
    State(state): State<AppState>,
    Query(query): Query<LikersQuery>,
) -> AppResult<impl IntoResponse> {
    let service = SqliteLikeService::new(state.db.clone());
    let users = service.list_likers(query.post_id)?;
    Ok(Json(users))
}
