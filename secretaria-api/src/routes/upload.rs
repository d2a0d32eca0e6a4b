/// Profile photo endpoints
///
/// # Endpoints
///
/// - `POST /api/upload/profile-photo` - multipart upload, field `file`
/// - `GET /api/upload/profile-photo/:filename` - public, served as JPEG
/// - `DELETE /api/upload/profile-photo` - remove the caller's photo
///
/// Validation, storage and normalization live in
/// `secretaria_shared::services::upload`.

use crate::app::AppState;
use axum::{
    extract::{Multipart, State},
    http::header,
    response::IntoResponse,
    Extension,
};
use secretaria_shared::{
    auth::middleware::AuthContext,
    error::ServiceError,
    services::{
        upload::{self, filename_from_url},
        MessageResponse,
    },
    web::{
        error::{ApiError, ApiResult},
        extract::{Json, Path},
    },
};
use serde::{Deserialize, Serialize};

/// Multipart field carrying the image
pub const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize, Deserialize)]
pub struct PhotoUploadResponse {
    pub message: String,
    pub photo_url: String,
    pub filename: String,
}

/// Upload or replace the caller's profile photo
///
/// # Errors
///
/// - `400 Bad Request`: No file, extension not allowed, larger than 5 MB,
///   or not a decodable image
pub async fn upload_profile_photo(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    mut multipart: Multipart,
) -> ApiResult<Json<PhotoUploadResponse>> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let original_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await?;

        let user = upload::upload_profile_photo(
            &state.db,
            &state.photos,
            &auth.user,
            original_name.as_deref(),
            bytes.to_vec(),
        )
        .await?;

        let photo_url = user.photo_url.unwrap_or_default();
        let filename = filename_from_url(&photo_url).unwrap_or_default().to_string();

        return Ok(Json(PhotoUploadResponse {
            message: "Profile photo uploaded successfully".to_string(),
            photo_url,
            filename,
        }));
    }

    Err(ServiceError::field(FILE_FIELD, "No file uploaded").into())
}

/// Serve a stored photo by filename
pub async fn get_profile_photo(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let bytes = state
        .photos
        .read(&filename)
        .await
        .map_err(|e| ApiError::from(ServiceError::from(e)))?;

    Ok(([(header::CONTENT_TYPE, "image/jpeg")], bytes))
}

/// Remove the caller's photo
///
/// # Errors
///
/// - `404 Not Found`: The caller has no photo
pub async fn delete_profile_photo(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<MessageResponse>> {
    upload::delete_profile_photo(&state.db, &state.photos, &auth.user).await?;
    Ok(Json(MessageResponse::new("Profile photo deleted successfully")))
}
