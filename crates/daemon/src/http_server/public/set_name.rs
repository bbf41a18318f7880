use axum::extract::{Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::cookie::SignedCookieJar;
use serde::Deserialize;

use crate::identity::{self, IdentityError};
use crate::share_manager::ShareManagerError;
use crate::ServiceState;

#[derive(Debug, Clone, Deserialize)]
pub struct SetNameRequest {
    #[serde(default)]
    pub username: String,
}

/// Bind a display name to the visitor's browser, then send them back to
///  the share
#[tracing::instrument(skip_all, fields(share = %hash))]
pub async fn handler(
    State(state): State<ServiceState>,
    Path(hash): Path<String>,
    jar: SignedCookieJar,
    Form(req): Form<SetNameRequest>,
) -> Result<impl IntoResponse, SetNameError> {
    let share = state.shares().find_share(&hash).await?;
    let jar = identity::bind(jar, &req.username, state.secure_cookies())?;

    Ok((jar, Redirect::to(&format!("/share/{}", share.hash))))
}

#[derive(Debug, thiserror::Error)]
pub enum SetNameError {
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error(transparent)]
    Shares(#[from] ShareManagerError),
}

impl IntoResponse for SetNameError {
    fn into_response(self) -> Response {
        match self {
            SetNameError::Identity(e) => {
                (http::StatusCode::BAD_REQUEST, e.to_string()).into_response()
            }
            SetNameError::Shares(e) => e.into_response(),
        }
    }
}
