use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::ResourcePath;
use crate::share_manager::ShareManagerError;
use crate::ServiceState;

/// Multipart field carrying the upload
const FILE_FIELD: &str = "file";

#[tracing::instrument(skip_all, fields(share_id = %path.id))]
pub async fn handler(
    State(state): State<ServiceState>,
    Path(path): Path<ResourcePath>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, UploadFileError> {
    let share_id = path.id()?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await?;

        tracing::info!(share_id, size = data.len(), "receiving upload");
        let file = state
            .shares()
            .upload_file(share_id, &filename, content_type.as_deref(), data)
            .await?;

        return Ok((http::StatusCode::CREATED, Json(file)));
    }

    Err(UploadFileError::MissingFile)
}

#[derive(Debug, thiserror::Error)]
pub enum UploadFileError {
    #[error("multipart field 'file' is required")]
    MissingFile,
    #[error("multipart error: {0}")]
    Multipart(#[from] MultipartError),
    #[error(transparent)]
    Shares(#[from] ShareManagerError),
}

impl IntoResponse for UploadFileError {
    fn into_response(self) -> Response {
        match self {
            UploadFileError::MissingFile => {
                (http::StatusCode::BAD_REQUEST, "file is required").into_response()
            }
            // oversized bodies surface here as 413
            UploadFileError::Multipart(e) => {
                tracing::warn!(error = %e, "rejected upload body");
                (e.status(), e.body_text()).into_response()
            }
            UploadFileError::Shares(e) => e.into_response(),
        }
    }
}
