use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::auth::policy;
use crate::auth::session::SessionContent;
use crate::error::{AppError, AppResult};
use crate::services::post::{PostService, SqlitePostService};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts", post(create_post).get(list_posts))
        .route("/posts/{id}", get(get_post).patch(edit_post).delete(delete_post))
}

#[derive(Deserialize)]
struct CreatePostRequest {
    title: String,
    content: String,
}

#[derive(Deserialize)]
struct EditPostRequest {
    title: Option<String>,
    content: Option<String>,
}

#[derive(Deserialize)]
struct ListQuery {
    page: Option<u32>,
}

/// POST /posts — create a post owned by the logged-in user
async fn create_post(
    State(state): State<AppState>,
    identity: SessionContent,
    Json(req): Json<CreatePostRequest>,
) -> AppResult<impl IntoResponse> {
    if req.title.trim().is_empty() {
        return Err(AppError::Validation("title must not be empty".into()));
    }

    let service = SqlitePostService::new(state.db.clone());
    let post = service.create(identity.user_id, &req.title, &req.content)?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// GET /posts?page= — newest first, 20 per page
async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<impl IntoResponse> {
    let service = SqlitePostService::new(state.db.clone());
    let posts = service.list(query.page.unwrap_or(1))?;
    Ok(Json(json!({ "posts": posts })))
}

/// GET /posts/{id}
async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let service = SqlitePostService::new(state.db.clone());
    let post = service
        .get(id)?
        .ok_or_else(|| AppError::NotFound("post not found".into()))?;
    Ok(Json(post))
}

/// PATCH /posts/{id} — author or admin only. Existence is checked
/// before authorization so a missing post reports not-found.
async fn edit_post(
    State(state): State<AppState>,
    identity: SessionContent,
    Path(id): Path<i64>,
    Json(req): Json<EditPostRequest>,
) -> AppResult<impl IntoResponse> {
    let service = SqlitePostService::new(state.db.clone());
    let target = service
        .get(id)?
        .ok_or_else(|| AppError::NotFound("post not found".into()))?;

    policy::ensure_may_modify(&identity, target.author_id, "edit")?;

    service.edit(id, req.title.as_deref(), req.content.as_deref())?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /posts/{id} — author or admin only
async fn delete_post(
    State(state): State<AppState>,
    identity: SessionContent,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let service = SqlitePostService::new(state.db.clone());
    let target = service
        .get(id)?
        .ok_or_else(|| AppError::NotFound("post not found".into()))?;

    policy::ensure_may_modify(&identity, target.author_id, "delete")?;

    service.delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}
