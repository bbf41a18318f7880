use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use axum_extra::extract::cookie::SignedCookieJar;
use serde::Serialize;

use crate::identity;
use crate::share_manager::{ShareManagerError, ShareView};
use crate::ServiceState;

#[derive(Debug, Serialize)]
pub struct ViewShareResponse {
    #[serde(flatten)]
    pub view: ShareView,
    /// Display name bound to this browser, if any
    pub username: Option<String>,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Path(hash): Path<String>,
    jar: SignedCookieJar,
) -> Result<impl IntoResponse, ShareManagerError> {
    let view = state.shares().view_share(&hash).await?;
    Ok(Json(ViewShareResponse {
        view,
        username: identity::resolve(&jar),
    }))
}
