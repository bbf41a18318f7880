use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

pub async fn not_found_handler() -> Response {
    not_found()
}

/// The one not-found answer. Unknown routes, unknown resources and a wrong
///  admin token all produce exactly these bytes, whatever the request asked
///  for.
pub fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        "not found",
    )
        .into_response()
}
