//! Photo upload, proxied to the image CDN

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::{ApiError, ApiResult, AppState, MAX_IMAGE_BYTES};

/// File part of a multipart form
#[derive(Debug)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Read the form field `name`; other fields are skipped
pub async fn read_file_field(
    multipart: &mut Multipart,
    name: &str,
    max_bytes: usize,
) -> ApiResult<UploadedFile> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(name) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;
        if bytes.len() > max_bytes {
            return Err(ApiError::PayloadTooLarge(format!(
                "File exceeds {} bytes",
                max_bytes
            )));
        }
        return Ok(UploadedFile {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }
    Err(ApiError::BadRequest(format!("Missing form field '{}'", name)))
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

/// POST /api/upload/image
///
/// Accepts `image/*` files up to 10 MiB and returns the CDN URL.
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let file = read_file_field(&mut multipart, "file", MAX_IMAGE_BYTES).await?;

    let content_type = file
        .content_type
        .filter(|ct| ct.starts_with("image/"))
        .ok_or_else(|| ApiError::BadRequest("Only image files can be uploaded".to_string()))?;
    if file.bytes.is_empty() {
        return Err(ApiError::BadRequest("Empty file".to_string()));
    }

    let size = file.bytes.len();
    let url = state
        .images
        .upload(&file.file_name, &content_type, file.bytes)
        .await?;

    info!(size, content_type = %content_type, "Photo uploaded");
    Ok(Json(UploadResponse { url }))
}
