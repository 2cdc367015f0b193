//! In-process harness for driving the router in tests.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use crate::api::server::{router, AppState};
use crate::config::Config;

pub struct TestApp {
    pub state: Arc<AppState>,
    app: Router,
    cookie: Option<String>,
    _dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::with_data_dir(dir.path().join("data"));
        let state = Arc::new(AppState::new(config).await.unwrap());

        Self {
            app: router(state.clone()),
            state,
            cookie: None,
            _dir: dir,
        }
    }

    pub async fn send(&mut self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let body = body.map(|v| v.to_string()).unwrap_or_default();
        self.send_raw(method, uri, &body).await
    }

    /// Sends the request with the current session cookie and remembers any
    /// cookie the response sets.
    pub async fn send_raw(&mut self, method: Method, uri: &str, body: &str) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if !body.is_empty() {
            request = request.header(header::CONTENT_TYPE, "application/json");
        }
        if let Some(cookie) = &self.cookie {
            request = request.header(header::COOKIE, cookie);
        }
        let request = request.body(Body::from(body.to_string())).unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();

        if let Some(set_cookie) = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
        {
            let pair = set_cookie.split(';').next().unwrap_or_default().trim();
            let has_value = pair.split_once('=').is_some_and(|(_, value)| !value.is_empty());
            self.cookie = has_value.then(|| pair.to_string());
        }

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    /// Signs up `name` with `name@example.com` / `password-name` and returns the user id.
    pub async fn signup(&mut self, name: &str) -> u64 {
        let (status, body) = self
            .send(
                Method::POST,
                "/auth/signup",
                Some(serde_json::json!({
                    "username": name,
                    "email": format!("{}@example.com", name),
                    "password": format!("password-{}", name),
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "signup failed: {}", body);
        body["user"]["id"].as_u64().unwrap()
    }

    pub async fn logout(&mut self) {
        let (status, _) = self.send(Method::POST, "/auth/logout", None).await;
        assert_eq!(status, StatusCode::OK);
        self.cookie = None;
    }

    /// Creates a todo and returns the response body.
    pub async fn create_todo(&mut self, body: Value) -> Value {
        let (status, todo) = self.send(Method::POST, "/todos", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {}", todo);
        todo
    }
}
