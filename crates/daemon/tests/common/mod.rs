//! Shared helpers: an isolated service (in-memory database and uploads)
//! driven through the router without binding a socket.

#![allow(dead_code)]

use axum::body::{to_bytes, Body, Bytes};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use feedback_daemon::{http_server, ServiceConfig, ServiceState};

pub const ADMIN_TOKEN: &str = "admin-test-token";
const BOUNDARY: &str = "feedback-test-boundary";

pub struct TestApp {
    pub router: Router,
    pub state: ServiceState,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(ServiceConfig::ephemeral(ADMIN_TOKEN)).await
    }

    pub async fn with_config(config: ServiceConfig) -> Self {
        let state = ServiceState::from_config(&config).await.unwrap();
        let router = http_server::router(state.clone(), config.max_upload_size);
        Self { router, state }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn create_share(&self, name: &str, description: &str) -> Value {
        let response = self
            .send(form_post(
                &admin_path("/shares"),
                &[("name", name), ("description", description)],
                None,
            ))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await
    }

    pub async fn upload(
        &self,
        share_id: i64,
        filename: &str,
        content_type: &str,
        data: &[u8],
    ) -> Response {
        let request = Request::post(admin_path(&format!("/shares/{share_id}/upload")))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body("file", filename, content_type, data)))
            .unwrap();
        self.send(request).await
    }

    pub async fn upload_ok(&self, share_id: i64, filename: &str, data: &[u8]) -> Value {
        let response = self.upload(share_id, filename, "text/plain", data).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await
    }

    /// Bind `name` on share `hash` and return the cookie to send back
    pub async fn set_name(&self, hash: &str, name: &str) -> String {
        let response = self
            .send(form_post(
                &format!("/share/{hash}/name"),
                &[("username", name)],
                None,
            ))
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        session_cookie(&response).expect("set-name must issue a session cookie")
    }

    pub async fn comment(&self, file_id: i64, cookie: Option<&str>, content: &str) -> Response {
        self.send(form_post(
            &format!("/api/files/{file_id}/comments"),
            &[("content", content)],
            cookie,
        ))
        .await
    }
}

pub fn admin_path(path: &str) -> String {
    format!("/admin/{ADMIN_TOKEN}{path}")
}

pub fn form_post(uri: &str, fields: &[(&str, &str)], cookie: Option<&str>) -> Request<Body> {
    let body = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(fields)
        .finish();

    let mut builder = Request::post(uri).header(
        header::CONTENT_TYPE,
        "application/x-www-form-urlencoded",
    );
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body)).unwrap()
}

pub fn multipart_body(field: &str, filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// `name=value` part of the session cookie set by `response`
pub fn session_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("user-session="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

pub async fn body_bytes(response: Response) -> Bytes {
    to_bytes(response.into_body(), usize::MAX).await.unwrap()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
