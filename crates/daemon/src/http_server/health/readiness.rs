use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tokio::time::timeout;

use super::data_source::StateDataSource;

const READINESS_TIMEOUT: Duration = Duration::from_secs(5);

#[tracing::instrument]
pub async fn handler(data_src: StateDataSource) -> Response {
    let (status, body) = match timeout(READINESS_TIMEOUT, data_src.is_ready()).await {
        Ok(Ok(())) => (StatusCode::OK, serde_json::json!({"status": "ok"})),
        Ok(Err(e)) => (
            StatusCode::SERVICE_UNAVAILABLE,
            serde_json::json!({
                "status": "failure",
                "dependency": e.dependency(),
                "message": e.to_string(),
            }),
        ),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            serde_json::json!({"status": "failure", "message": "readiness check timed out"}),
        ),
    };

    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::to_bytes;

    use super::*;
    use crate::http_server::health::data_source::tests::MockReadiness;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_ready() {
        let response = handler(StateDataSource::new(Arc::new(MockReadiness::Ready))).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_failing_dependency_is_named() {
        for (mock, dependency) in [
            (MockReadiness::DatabaseDown, "database"),
            (MockReadiness::UploadsDown, "uploads"),
        ] {
            let response = handler(StateDataSource::new(Arc::new(mock))).await;
            assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
            assert_eq!(body_json(response).await["dependency"], dependency);
        }
    }
}
