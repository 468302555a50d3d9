//! Product endpoint behaviour over the in-memory datastore.

use axum::http::{header, StatusCode};
use serde_json::json;

mod common;
use common::{app, create, send, TestRequest};

#[tokio::test]
async fn test_round_trip_create_then_get() {
    let app = app();
    let id = create(&app, "A", json!(10), "u").await;

    let res = send(&app, TestRequest::get(&format!("/api/products/{}", id))).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["success"], true);

    let data = &res.body["data"];
    assert_eq!(data["id"], id);
    assert_eq!(data["name"], "A");
    assert_eq!(data["price"], 10.0);
    assert_eq!(data["image"], "u");
    assert!(data["created_at"].is_string());
}

#[tokio::test]
async fn test_create_returns_created_row() {
    let app = app();
    let res = send(
        &app,
        TestRequest::post("/api/products").json(json!({"name": "Mug", "price": "12.50", "image": "https://cdn/mug.png"})),
    )
    .await;

    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["message"], "Product created successfully");
    assert_eq!(res.body["data"]["price"], 12.5);
    assert!(res.body["data"]["id"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn test_invalid_price_rejected_and_nothing_persisted() {
    let app = app();

    for price in [json!(0), json!(-3.5), json!("abc"), json!(true), json!("-1")] {
        let res = send(
            &app,
            TestRequest::post("/api/products").json(json!({"name": "A", "price": price, "image": "u"})),
        )
        .await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST, "price {} should be rejected", price);
        assert_eq!(res.body["success"], false);
        assert!(res.body["message"].as_str().unwrap().starts_with("invalid price"));
    }

    let list = send(&app, TestRequest::get("/api/products")).await;
    assert_eq!(list.body["count"], 0);
    assert_eq!(list.body["data"], json!([]));
}

#[tokio::test]
async fn test_missing_fields_rejected() {
    let app = app();
    for body in [
        json!({"price": 5, "image": "u"}),
        json!({"name": "", "price": 5, "image": "u"}),
        json!({"name": "A", "image": "u"}),
        json!({"name": "A", "price": 5}),
    ] {
        let res = send(&app, TestRequest::post("/api/products").json(body)).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert!(res.body["message"].as_str().unwrap().starts_with("missing fields"));
    }
}

#[tokio::test]
async fn test_non_numeric_ids_are_bad_requests() {
    let app = app();
    create(&app, "A", json!(1), "u").await;

    for id in ["abc", "1.5", "1e3", "%20"] {
        let uri = format!("/api/products/{}", id);
        let get = send(&app, TestRequest::get(&uri)).await;
        let put = send(&app, TestRequest::put(&uri).json(json!({"name": "B"}))).await;
        let delete = send(&app, TestRequest::delete(&uri)).await;

        for res in [get, put, delete] {
            assert_eq!(res.status, StatusCode::BAD_REQUEST, "id {:?}", id);
            assert!(res.body["message"].as_str().unwrap().starts_with("invalid id"));
        }
    }
}

#[tokio::test]
async fn test_missing_product_is_not_found() {
    let app = app();
    let get = send(&app, TestRequest::get("/api/products/999")).await;
    assert_eq!(get.status, StatusCode::NOT_FOUND);
    assert_eq!(get.body["message"], "Product not found");

    let put = send(&app, TestRequest::put("/api/products/999").json(json!({"price": 3}))).await;
    assert_eq!(put.status, StatusCode::NOT_FOUND);
    assert_eq!(put.body["message"], "Product to update not found");
}

#[tokio::test]
async fn test_empty_update_leaves_row_unchanged() {
    let app = app();
    let id = create(&app, "A", json!(10), "u").await;
    let uri = format!("/api/products/{}", id);

    for body in [json!({}), json!({"name": "", "price": null, "image": "  "}), json!({"color": "red"})] {
        let res = send(&app, TestRequest::put(&uri).json(body)).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert!(res.body["message"].as_str().unwrap().starts_with("no fields to update"));
    }

    let res = send(&app, TestRequest::get(&uri)).await;
    assert_eq!(res.body["data"]["name"], "A");
    assert_eq!(res.body["data"]["price"], 10.0);
    assert_eq!(res.body["data"]["image"], "u");
}

#[tokio::test]
async fn test_partial_update_changes_only_named_fields() {
    let app = app();
    let id = create(&app, "A", json!(10), "u").await;
    let uri = format!("/api/products/{}", id);

    let before = send(&app, TestRequest::get(&uri)).await.body["data"].clone();

    let res = send(&app, TestRequest::put(&uri).json(json!({"price": 25.5}))).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["price"], 25.5);

    let after = send(&app, TestRequest::get(&uri)).await.body["data"].clone();
    assert_eq!(after["name"], "A");
    assert_eq!(after["image"], "u");
    assert_eq!(after["price"], 25.5);
    assert_eq!(after["created_at"], before["created_at"]);
}

#[tokio::test]
async fn test_update_with_invalid_price_is_rejected() {
    let app = app();
    let id = create(&app, "A", json!(10), "u").await;
    let uri = format!("/api/products/{}", id);

    let res = send(&app, TestRequest::put(&uri).json(json!({"name": "B", "price": 0}))).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = send(&app, TestRequest::get(&uri)).await;
    assert_eq!(res.body["data"]["name"], "A");
}

#[tokio::test]
async fn test_delete_twice() {
    let app = app();
    let id = create(&app, "A", json!(10), "u").await;
    let uri = format!("/api/products/{}", id);

    let first = send(&app, TestRequest::delete(&uri)).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["data"]["id"], id);
    assert_eq!(first.body["data"]["name"], "A");

    let second = send(&app, TestRequest::delete(&uri)).await;
    assert_eq!(second.status, StatusCode::NOT_FOUND);
    assert_eq!(second.body["success"], false);
}

#[tokio::test]
async fn test_ids_are_not_reused() {
    let app = app();
    let first = create(&app, "A", json!(1), "u").await;
    send(&app, TestRequest::delete(&format!("/api/products/{}", first))).await;

    let second = create(&app, "B", json!(1), "u").await;
    assert!(second > first);
}

#[tokio::test]
async fn test_list_newest_first() {
    let app = app();
    let r1 = create(&app, "R1", json!(1), "u").await;
    let r2 = create(&app, "R2", json!(2), "u").await;
    let r3 = create(&app, "R3", json!(3), "u").await;

    let res = send(&app, TestRequest::get("/api/products")).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["count"], 3);

    let ids: Vec<i64> = res.body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![r3, r2, r1]);
}

#[tokio::test]
async fn test_malformed_json_gets_envelope() {
    let app = app();
    let res = send(&app, TestRequest::post("/api/products").raw_json("{\"name\": ")).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["success"], false);
    assert!(res.body["message"].as_str().unwrap().starts_with("Invalid JSON body"));
}

#[tokio::test]
async fn test_unknown_route_gets_envelope() {
    let app = app();
    let res = send(&app, TestRequest::get("/api/orders")).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body["success"], false);
    assert_eq!(res.body["message"], "Route not found");
}

#[tokio::test]
async fn test_health() {
    let app = app();
    let res = send(&app, TestRequest::get("/health")).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["success"], true);
    assert_eq!(res.body["data"]["datastore"], "up");
}

#[tokio::test]
async fn test_response_headers() {
    let app = app();
    let res = send(&app, TestRequest::get("/api/products")).await;

    let request_id = res.headers["x-request-id"].to_str().unwrap();
    assert!(uuid::Uuid::parse_str(request_id).is_ok());
    assert_eq!(res.headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(res.headers[header::X_FRAME_OPTIONS], "SAMEORIGIN");
    assert_eq!(res.headers[header::CONTENT_SECURITY_POLICY], "default-src 'self'");

    let res = send(&app, TestRequest::get("/api/products").header("x-request-id", "trace-42")).await;
    assert_eq!(res.headers["x-request-id"], "trace-42");
}

#[tokio::test]
async fn test_concurrent_creates_get_distinct_ids() {
    let app = app();
    let creates = (0..20).map(|i| {
        let app = app.clone();
        async move { create(&app, &format!("P{}", i), json!(i + 1), "u").await }
    });
    let mut ids = futures_util::future::join_all(creates).await;
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 20);
}

mod failing {
    use async_trait::async_trait;
    use product_api::product::{Product, Statement};
    use product_api::store::{Datastore, StoreError};

    pub struct DownStore;

    #[async_trait]
    impl Datastore for DownStore {
        async fn execute(&self, _: &Statement) -> Result<Vec<Product>, StoreError> {
            Err(StoreError::Malformed("connection refused".into()))
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Err(StoreError::Malformed("connection refused".into()))
        }
    }

    pub struct StalledStore;

    #[async_trait]
    impl Datastore for StalledStore {
        async fn execute(&self, _: &Statement) -> Result<Vec<Product>, StoreError> {
            tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
            Ok(Vec::new())
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Ok(())
        }
    }
}

#[tokio::test]
async fn test_datastore_failure_is_500_with_detail() {
    let server = product_api::HttpServer::new(
        common::memory_config(),
        std::sync::Arc::new(failing::DownStore),
    )
    .unwrap();
    let app = server.router();

    let res = send(&app, TestRequest::get("/api/products")).await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.body["success"], false);
    assert_eq!(res.body["message"], "Server error while listing products");
    assert!(res.body["error"].as_str().unwrap().contains("connection refused"));

    // Validation is decided before the datastore is touched.
    let res = send(&app, TestRequest::get("/api/products/abc")).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = send(&app, TestRequest::get("/health")).await;
    assert_eq!(res.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(res.body["data"]["datastore"], "down");
}

#[tokio::test(start_paused = true)]
async fn test_stalled_datastore_hits_request_timeout() {
    let mut config = common::memory_config();
    config.timeouts.request_secs = 2;
    let server =
        product_api::HttpServer::new(config, std::sync::Arc::new(failing::StalledStore)).unwrap();
    let app = server.router();

    let res = send(&app, TestRequest::get("/api/products")).await;
    assert_eq!(res.status, StatusCode::REQUEST_TIMEOUT);

    let res = send(&app, TestRequest::get("/health")).await;
    assert_eq!(res.status, StatusCode::OK);
}
