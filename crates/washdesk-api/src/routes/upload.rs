use axum::{
    extract::{multipart::MultipartError, Multipart},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{ApiError, ApiResult};

pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
const MAX_UPLOAD_LABEL: &str = "5MB";
/// Request body cap for `/upload`: the file plus multipart framing
pub const BODY_LIMIT_BYTES: usize = MAX_UPLOAD_BYTES + 64 * 1024;

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadedFile {
    pub name: String,
    pub size: usize,
    pub mimetype: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub success: bool,
    pub file: UploadedFile,
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::FileTooLarge { max_size: MAX_UPLOAD_LABEL }
    } else {
        ApiError::BadRequest(e.body_text())
    }
}

/// Accept one complaint photo in the `file` field and describe it
///
/// Nothing is stored; the form attaches photos by URL.
#[utoipa::path(
    post,
    path = "/upload",
    request_body(content = String, description = "Image in the `file` field", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File accepted", body = UploadResponse),
        (status = 400, description = "Missing file, not an image, or larger than 5MB"),
        (status = 429, description = "Rate limited")
    ),
    tag = "relay"
)]
pub async fn upload_file(mut multipart: Multipart) -> ApiResult<Json<UploadResponse>> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }

        let name = field.file_name().unwrap_or_default().to_string();
        let mimetype = field.content_type().unwrap_or_default().to_string();
        if !mimetype.starts_with("image/") {
            return Err(ApiError::BadRequest("Only image files are allowed".to_string()));
        }

        let data = field.bytes().await.map_err(multipart_error)?;
        if data.len() > MAX_UPLOAD_BYTES {
            return Err(ApiError::FileTooLarge { max_size: MAX_UPLOAD_LABEL });
        }

        tracing::info!(name = %name, size = data.len(), mimetype = %mimetype, "file uploaded");
        return Ok(Json(UploadResponse {
            success: true,
            file: UploadedFile {
                name,
                size: data.len(),
                mimetype,
            },
        }));
    }

    Err(ApiError::BadRequest("No file provided".to_string()))
}
