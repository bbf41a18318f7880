use axum::extract::State;
use axum::response::IntoResponse;
use axum::{Form, Json};
use serde::Deserialize;

use crate::share_manager::ShareManagerError;
use crate::ServiceState;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateShareRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[tracing::instrument(skip_all)]
pub async fn handler(
    State(state): State<ServiceState>,
    Form(req): Form<CreateShareRequest>,
) -> Result<impl IntoResponse, ShareManagerError> {
    let share = state
        .shares()
        .create_share(&req.name, req.description.as_deref())
        .await?;

    Ok((http::StatusCode::CREATED, Json(share)))
}
