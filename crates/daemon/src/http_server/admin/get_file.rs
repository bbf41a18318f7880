use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;

use super::ResourcePath;
use crate::share_manager::ShareManagerError;
use crate::ServiceState;

pub async fn handler(
    State(state): State<ServiceState>,
    Path(path): Path<ResourcePath>,
) -> Result<impl IntoResponse, ShareManagerError> {
    let file = state.shares().get_file(path.id()?).await?;
    Ok(Json(file))
}
