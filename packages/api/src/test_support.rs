//! In-process harness for the HTTP tests.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use store::{MemoryStore, Store};
use tower::ServiceExt;
use uuid::Uuid;

use crate::{router, session_layer, settings, AppState};

pub(crate) struct TestApp {
    router: Router,
    pub store: MemoryStore,
}

/// A registered user and the session cookie to act as them.
pub(crate) struct TestUser {
    pub id: Uuid,
    pub cookie: String,
}

pub(crate) struct TestResponse {
    pub status: StatusCode,
    /// `id=...` pair from `set-cookie`, if the response set one.
    pub cookie: Option<String>,
    pub body: Value,
}

impl TestApp {
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let shared: Arc<dyn Store> = Arc::new(store.clone());
        let sessions = session_layer(
            tower_sessions::MemoryStore::default(),
            &settings::Session {
                secure: false,
                expiry_days: 7,
            },
        );
        let router = router(AppState::new(shared)).layer(sessions);
        Self { router, store }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_string);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        TestResponse {
            status,
            cookie,
            body,
        }
    }

    pub async fn get(&self, uri: &str, user: &TestUser) -> TestResponse {
        self.request(Method::GET, uri, Some(&user.cookie), None).await
    }

    pub async fn post(&self, uri: &str, user: &TestUser, body: Value) -> TestResponse {
        self.request(Method::POST, uri, Some(&user.cookie), Some(body))
            .await
    }

    /// Register through the API and keep the session cookie.
    pub async fn register(&self, name: &str) -> TestUser {
        let email = format!("{}@example.com", name.to_lowercase());
        let response = self
            .request(
                Method::POST,
                "/api/register",
                None,
                Some(json!({ "email": email, "name": name, "password": "hunter2hunter2" })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);

        let id = self.store.user_by_email(&email).await.unwrap().unwrap().id;
        TestUser {
            id,
            cookie: response.cookie.unwrap(),
        }
    }

    /// Register `name` and save `answers` for them.
    pub async fn register_with_answers(&self, name: &str, answers: &[u8]) -> TestUser {
        let user = self.register(name).await;
        let response = self
            .post(
                "/api/compatibility/save",
                &user,
                json!({ "answers": answers }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        user
    }

    /// Like each other so that `a` and `b` become connected.
    pub async fn connect(&self, a: &TestUser, b: &TestUser) {
        self.post("/api/swipes", a, json!({ "to": b.id, "kind": "like" }))
            .await;
        let response = self
            .post("/api/swipes", b, json!({ "to": a.id, "kind": "like" }))
            .await;
        assert_eq!(response.body["matched"], true);
    }
}
