use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::auth::policy;
use crate::auth::session::SessionContent;
use crate::error::{AppError, AppResult};
use crate::services::comment::{CommentService, SqliteCommentService};
use crate::services::post::{PostService, SqlitePostService};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/comments", get(list_comments).post(create_comment))
        .route("/comments/{id}", patch(edit_comment).delete(delete_comment))
}

#[derive(Deserialize)]
struct CreateCommentRequest {
    post_id: i64,
    content: String,
}

#[derive(Deserialize)]
struct EditCommentRequest {
    content: String,
}

#[derive(Deserialize)]
struct ListQuery {
    post_id: Option<i64>,
    user_id: Option<i64>,
    page: Option<u32>,
}

/// POST /comments — the target post must exist
async fn create_comment(
    State(state): State<AppState>,
    identity: SessionContent,
    Json(req): Json<CreateCommentRequest>,
) -> AppResult<impl IntoResponse> {
    if req.content.trim().is_empty() {
        return Err(AppError::Validation("content must not be empty".into()));
    }

    SqlitePostService::new(state.db.clone())
        .get(req.post_id)?
        .ok_or_else(|| AppError::NotFound("post not found".into()))?;

    let service = SqliteCommentService::new(state.db.clone());
    let comment = service.create(identity.user_id, req.post_id, &req.content)?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// GET /comments?post_id=&user_id=&page= — both filters optional and
/// combinable; with neither, all comments are listed
async fn list_comments(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<impl IntoResponse> {
    let service = SqliteCommentService::new(state.db.clone());
    let page = query.page.unwrap_or(1);

    let comments = match (query.post_id, query.user_id) {
        (Some(post_id), Some(user_id)) => service.list_by_post_and_author(post_id, user_id, page)?,
        (Some(post_id), None) => service.list_by_post(post_id, page)?,
        (None, Some(user_id)) => service.list_by_author(user_id, page)?,
        (None, None) => service.list_all(page)?,
    };

    Ok(Json(json!({ "comments": comments })))
}

/// PATCH /comments/{id} — author or admin only. Existence is checked
/// before authorization so a missing comment reports not-found, never
/// forbidden.
async fn edit_comment(
    State(state): State<AppState>,
    identity: SessionContent,
    Path(id): Path<i64>,
    Json(req): Json<EditCommentRequest>,
) -> AppResult<impl IntoResponse> {
    let service = SqliteCommentService::new(state.db.clone());
    let target = service
        .get(id)?
        .ok_or_else(|| AppError::NotFound("comment not found".into()))?;

    policy::ensure_may_modify(&identity, target.author_id, "edit")?;

    service.edit(id, &req.content)?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /comments/{id} — author or admin only
async fn delete_comment(
    State(state): State<AppState>,
    identity: SessionContent,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let service = SqliteCommentService::new(state.db.clone());
    let target = service
        .get(id)?
        .ok_or_else(|| AppError::NotFound("comment not found".into()))?;

    policy::ensure_may_modify(&identity, target.author_id, "delete")?;

    service.delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}
