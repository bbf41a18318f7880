use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use super::ResourcePath;
use crate::share_manager::ShareManagerError;
use crate::ServiceState;

#[derive(Debug, Serialize)]
pub struct DeleteFileResponse {
    pub deleted: i64,
    pub share_id: i64,
}

#[tracing::instrument(skip_all, fields(file_id = %path.id))]
pub async fn handler(
    State(state): State<ServiceState>,
    Path(path): Path<ResourcePath>,
) -> Result<impl IntoResponse, ShareManagerError> {
    let file = state.shares().delete_file(path.id()?).await?;
    Ok(Json(DeleteFileResponse {
        deleted: file.id,
        share_id: file.share_id,
    }))
}
