use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;

use crate::auth::session::SessionContent;
use crate::error::{AppError, AppResult};
use crate::services::image::{ImageService, SqliteImageService};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/users/me/image", post(upload_profile_image))
}

/// POST /users/me/image — multipart upload of the caller's profile
/// image. Replacing a previous image is best-effort; the upload
/// succeeds even if the old file lingers for the cleanup sweep.
async fn upload_profile_image(
    State(state): State<AppState>,
    identity: SessionContent,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("malformed multipart body: {}", e)))?
    {
        if field.name() == Some("image") {
            let file_name = field
                .file_name()
                .map(str::to_string)
                .ok_or_else(|| AppError::Validation("image field needs a file name".into()))?;
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("malformed multipart body: {}", e)))?;
            upload = Some((file_name, bytes.to_vec()));
        }
    }

    let (file_name, bytes) =
        upload.ok_or_else(|| AppError::Validation("missing image field".into()))?;

    let service = SqliteImageService::new(state.db.clone(), state.config.uploads_path().clone());
    let image = service.save_profile_image(identity.user_id, &file_name, &bytes)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": image.id, "name": image.name })),
    ))
}
