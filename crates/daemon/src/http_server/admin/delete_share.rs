use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use super::ResourcePath;
use crate::share_manager::ShareManagerError;
use crate::ServiceState;

#[derive(Debug, Serialize)]
pub struct DeleteShareResponse {
    pub deleted: i64,
}

#[tracing::instrument(skip_all, fields(share_id = %path.id))]
pub async fn handler(
    State(state): State<ServiceState>,
    Path(path): Path<ResourcePath>,
) -> Result<impl IntoResponse, ShareManagerError> {
    let share = state.shares().delete_share(path.id()?).await?;
    Ok(Json(DeleteShareResponse { deleted: share.id }))
}
