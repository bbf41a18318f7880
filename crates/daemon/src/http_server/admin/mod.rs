//! Admin surface, mounted under `/admin/:token`.
//!
//! Every route sits behind [`require_admin`]. A wrong token gets the same
//! answer as a path that doesn't exist.

use std::collections::HashMap;

use axum::extract::{Path, Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;

use super::handlers::not_found;
use crate::share_manager::ShareManagerError;
use crate::ServiceState;

pub mod create_share;
pub mod delete_file;
pub mod delete_share;
pub mod get_file;
pub mod get_share;
pub mod list_shares;
pub mod upload_file;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/", get(list_shares::handler))
        .route(
            "/shares",
            get(list_shares::handler).post(create_share::handler),
        )
        .route("/shares/:id", get(get_share::handler))
        .route("/shares/:id/upload", post(upload_file::handler))
        .route("/shares/:id/delete", post(delete_share::handler))
        .route("/files/:id", get(get_file::handler))
        .route("/files/:id/delete", post(delete_file::handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin))
        .with_state(state)
}

/// Let the request through only when its `:token` segment equals the
///  configured admin token
pub async fn require_admin(
    State(state): State<ServiceState>,
    params: Option<Path<HashMap<String, String>>>,
    request: Request,
    next: Next,
) -> Response {
    let authorized = params
        .as_ref()
        .and_then(|Path(params)| params.get("token"))
        .is_some_and(|token| state.is_admin_token(token));

    if !authorized {
        return not_found();
    }
    next.run(request).await
}

/// `:id` segment of an admin route. Anything that isn't a row id is simply
///  not found.
#[derive(Debug, Deserialize)]
pub struct ResourcePath {
    id: String,
}

impl ResourcePath {
    pub fn id(&self) -> Result<i64, ShareManagerError> {
        self.id.parse().map_err(|_| ShareManagerError::NotFound)
    }
}
