use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;

use super::ResourcePath;
use crate::share_manager::ShareManagerError;
use crate::ServiceState;

/// Share with its files, newest upload first
pub async fn handler(
    State(state): State<ServiceState>,
    Path(path): Path<ResourcePath>,
) -> Result<impl IntoResponse, ShareManagerError> {
    let detail = state.shares().share_detail(path.id()?).await?;
    Ok(Json(detail))
}
