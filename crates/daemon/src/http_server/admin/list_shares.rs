use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::database::models::ShareWithStats;
use crate::share_manager::ShareManagerError;
use crate::ServiceState;

#[derive(Debug, Serialize)]
pub struct ListSharesResponse {
    pub shares: Vec<ShareWithStats>,
}

pub async fn handler(
    State(state): State<ServiceState>,
) -> Result<impl IntoResponse, ShareManagerError> {
    let shares = state.shares().list_shares().await?;
    Ok(Json(ListSharesResponse { shares }))
}
