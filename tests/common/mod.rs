//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use product_api::config::{AppConfig, DatabaseBackend};
use product_api::store::MemoryStore;
use product_api::HttpServer;

pub const BROWSER: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_5) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Safari/605.1.15";

pub const CLIENT: &str = "198.51.100.20:40000";

/// In-memory config with a bucket large enough that CRUD tests never hit it.
pub fn memory_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.database.backend = DatabaseBackend::Memory;
    config.admission.rate_limit.capacity = 1_000;
    config.admission.rate_limit.refill_rate = 1_000;
    config
}

/// In-memory config with the default admission policy.
pub fn guarded_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.database.backend = DatabaseBackend::Memory;
    config
}

pub fn server(config: AppConfig) -> (HttpServer, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let server = HttpServer::new(config, store.clone()).unwrap();
    (server, store)
}

pub fn app() -> Router {
    server(memory_config()).0.router()
}

/// Request builder with a browser agent and a peer address attached.
pub struct TestRequest {
    method: Method,
    uri: String,
    body: Option<Body>,
    peer: Option<SocketAddr>,
    headers: Vec<(String, String)>,
    user_agent: Option<String>,
}

impl TestRequest {
    pub fn new(method: Method, uri: &str) -> Self {
        Self {
            method,
            uri: uri.to_string(),
            body: None,
            peer: CLIENT.parse().ok(),
            headers: Vec::new(),
            user_agent: Some(BROWSER.to_string()),
        }
    }

    pub fn get(uri: &str) -> Self {
        Self::new(Method::GET, uri)
    }

    pub fn post(uri: &str) -> Self {
        Self::new(Method::POST, uri)
    }

    pub fn put(uri: &str) -> Self {
        Self::new(Method::PUT, uri)
    }

    pub fn delete(uri: &str) -> Self {
        Self::new(Method::DELETE, uri)
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(Body::from(body.to_string()));
        self.headers
            .push((header::CONTENT_TYPE.to_string(), "application/json".into()));
        self
    }

    pub fn raw_json(mut self, body: impl Into<String>) -> Self {
        self.body = Some(Body::from(body.into()));
        self.headers
            .push((header::CONTENT_TYPE.to_string(), "application/json".into()));
        self
    }

    pub fn from_ip(mut self, ip: &str) -> Self {
        self.peer = Some(SocketAddr::new(ip.parse().unwrap(), 40000));
        self
    }

    pub fn no_peer(mut self) -> Self {
        self.peer = None;
        self
    }

    pub fn user_agent(mut self, ua: Option<&str>) -> Self {
        self.user_agent = ua.map(String::from);
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn build(self) -> Request<Body> {
        let mut builder = Request::builder().method(self.method).uri(self.uri);
        if let Some(ua) = self.user_agent {
            builder = builder.header(header::USER_AGENT, ua);
        }
        for (name, value) in self.headers {
            builder = builder.header(name, value);
        }
        let mut request = builder.body(self.body.unwrap_or_else(Body::empty)).unwrap();
        if let Some(peer) = self.peer {
            request.extensions_mut().insert(ConnectInfo(peer));
        }
        request
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Drive one request through the router.
pub async fn send(app: &Router, request: TestRequest) -> TestResponse {
    let response = app.clone().oneshot(request.build()).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    TestResponse { status, headers, body }
}

/// Create a product and return its id.
pub async fn create(app: &Router, name: &str, price: Value, image: &str) -> i64 {
    let res = send(
        app,
        TestRequest::post("/api/products")
            .json(serde_json::json!({ "name": name, "price": price, "image": image })),
    )
    .await;
    assert_eq!(res.status, StatusCode::CREATED, "create failed: {}", res.body);
    res.body["data"]["id"].as_i64().unwrap()
}
