use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use cloudcost_persist::{FileType, NewUpload, UploadedFile};
use crate::{
    error::{ApiError, ApiResult},
    extract::UserId,
    state::AppState,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileResponse {
    pub id: String,
    pub file_name: String,
    /// `plan`, `metrics` or `other`
    pub file_type: String,
    pub size: usize,
    pub session_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<UploadedFile> for FileResponse {
    fn from(file: UploadedFile) -> Self {
        Self {
            id: file.id.to_string(),
            file_name: file.file_name,
            file_type: file.file_type.to_string(),
            size: file.size,
            session_id: file.session_id,
            created_at: file.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub file: FileResponse,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteResponse {
    pub deleted: bool,
}

/// Upload a plan or metrics file ahead of a chat turn
///
/// Multipart fields: `file` (required), `fileType` (`plan` | `metrics`),
/// `sessionId` (correlation id later passed to `POST /api/chat`).
#[utoipa::path(
    post,
    path = "/api/files/upload",
    responses(
        (status = 200, description = "File stored", body = UploadResponse),
        (status = 400, description = "Missing or empty file"),
        (status = 413, description = "File too large")
    ),
    tag = "files"
)]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut file_type = FileType::Other;
    let mut session_id = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let data = field.bytes().await.map_err(multipart_error)?;
                file = Some((file_name, data.to_vec()));
            }
            "fileType" => {
                let text = field.text().await.map_err(multipart_error)?;
                file_type = text.parse().unwrap_or(FileType::Other);
            }
            "sessionId" => {
                session_id = Some(field.text().await.map_err(multipart_error)?);
            }
            _ => {}
        }
    }

    let (file_name, data) = file.ok_or_else(|| {
        ApiError::BadRequest("Missing 'file' field in multipart form".to_string())
    })?;

    let stored = state
        .uploads
        .store(
            NewUpload {
                user_id,
                session_id,
                file_type,
                file_name,
            },
            &data,
        )
        .await?;

    tracing::info!(id = %stored.id, size = stored.size, file_type = %stored.file_type, "File uploaded");

    Ok(Json(UploadResponse {
        file: stored.into(),
    }))
}

/// Delete a pending upload
#[utoipa::path(
    delete,
    path = "/api/files/{id}",
    params(
        ("id" = String, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File deleted", body = DeleteResponse),
        (status = 404, description = "File not found")
    ),
    tag = "files"
)]
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    state.uploads.delete(&user_id, &id).await?;
    Ok(Json(DeleteResponse { deleted: true }))
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge("Upload exceeds the size limit".to_string())
    } else {
        ApiError::BadRequest(format!("Multipart error: {}", e))
    }
}
