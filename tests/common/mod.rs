//! Shared helpers for HTTP tests.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use tafeito::auth::{AuthService, PasswordHasher, TokenStore};
use tafeito::server::{self, AppState};
use tafeito::store::MemoryStore;

pub const ORIGIN: &str = "http://localhost:4200";

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
}

pub fn create_test_app() -> TestApp {
    create_test_app_with(false)
}

pub fn create_test_app_with(serialize_reconciliation: bool) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let auth = AuthService::new(
        store.clone(),
        PasswordHasher::with_params(1024, 1, 1).unwrap(),
        Arc::new(TokenStore::new(30)),
    );
    let state = AppState::new(store.clone(), auth, serialize_reconciliation);
    let router = server::router(state, &[ORIGIN.to_string()]);

    TestApp { router, store }
}

impl TestApp {
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
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
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    /// Signs up a user and returns their bearer token.
    pub async fn signup(&self, email: &str) -> String {
        let (status, body) = self
            .request(
                Method::POST,
                "/auth/signup",
                None,
                Some(json!({
                    "email": email,
                    "name": "Teste",
                    "password": "teste123!"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "signup failed: {}", body);
        body["access_token"].as_str().unwrap().to_string()
    }

    /// Creates a checklist and returns its id.
    pub async fn create_checklist(&self, token: &str, name: &str) -> String {
        let (status, body) = self
            .request(
                Method::POST,
                "/checklists",
                Some(token),
                Some(json!({ "name": name })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create failed: {}", body);
        body["id"].as_str().unwrap().to_string()
    }

    pub async fn put_items(&self, token: &str, checklist_id: &str, items: Value) -> (StatusCode, Value) {
        self.request(
            Method::PUT,
            &format!("/checklists/{}/items", checklist_id),
            Some(token),
            Some(json!({ "items": items })),
        )
        .await
    }
}

pub fn titles(items: &Value) -> Vec<String> {
    items
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["title"].as_str().unwrap().to_string())
        .collect()
}
