use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::{Form, Json};
use axum_extra::extract::cookie::SignedCookieJar;
use serde::Deserialize;

use crate::identity;
use crate::share_manager::ShareManagerError;
use crate::ServiceState;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCommentRequest {
    #[serde(default)]
    pub content: String,
}

#[tracing::instrument(skip_all, fields(file_id = %id))]
pub async fn handler(
    State(state): State<ServiceState>,
    Path(id): Path<String>,
    jar: SignedCookieJar,
    Form(req): Form<CreateCommentRequest>,
) -> Result<impl IntoResponse, ShareManagerError> {
    let file_id: i64 = id.parse().map_err(|_| ShareManagerError::NotFound)?;
    let author = identity::resolve(&jar);

    let comment = state
        .shares()
        .add_comment(file_id, author.as_deref(), &req.content)
        .await?;

    Ok((http::StatusCode::CREATED, Json(comment)))
}
