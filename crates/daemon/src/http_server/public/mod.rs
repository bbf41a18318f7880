//! Visitor surface. Holding a share or file hash is the only credential.

use axum::routing::{get, post};
use axum::Router;

use crate::ServiceState;

pub mod create_comment;
pub mod download;
pub mod set_name;
pub mod view_share;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/share/:hash", get(view_share::handler))
        .route("/share/:hash/name", post(set_name::handler))
        .route("/files/:hash", get(download::handler))
        .route("/api/files/:id/comments", post(create_comment::handler))
        .with_state(state)
}
