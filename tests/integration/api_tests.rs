//! API integration tests against the in-memory item store

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use catalog_server::{
    api, repository::MemoryItemStore, services::Services, AppState,
};

fn app() -> Router {
    let state = AppState {
        services: Arc::new(Services::new(Arc::new(MemoryItemStore::new()))),
    };
    api::router(state)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(format!("/api/v1{}", uri))
        .header("content-type", "application/json");
    let request = match body {
        Some(body) => request.body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .expect("Failed to build request");

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("Failed to send request");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Failed to parse response")
    };
    (status, body)
}

fn dune() -> Value {
    json!({
        "kind": "book",
        "title": "Dune",
        "author": "Herbert",
        "isbn": "978-0",
        "publishedYear": 1965,
        "genre": "SciFi"
    })
}

#[tokio::test]
async fn test_health_check() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_borrow_return_lifecycle() {
    let app = app();

    let (status, created) = send(&app, Method::POST, "/items", Some(dune())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["kind"], "book");
    assert_eq!(created["isBorrowed"], false);
    assert_eq!(created["publishedYear"], 1965);
    assert!(created.get("publisher").is_none());
    let id = created["id"].as_str().expect("No item ID").to_string();

    let (status, body) = send(&app, Method::POST, &format!("/items/{}/borrow", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isBorrowed"], true);

    let (status, body) = send(&app, Method::POST, &format!("/items/{}/borrow", id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "ItemNotAvailable");

    let (_, body) = send(&app, Method::GET, &format!("/items/{}", id), None).await;
    assert_eq!(body["isBorrowed"], true);

    let (status, body) = send(&app, Method::POST, &format!("/items/{}/return", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isBorrowed"], false);

    let (status, body) = send(&app, Method::POST, &format!("/items/{}/return", id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "ItemNotBorrowed");
}

#[tokio::test]
async fn test_invalid_id_and_not_found() {
    let app = app();

    let (status, body) = send(&app, Method::GET, "/items/not-an-id", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidId");

    let missing = "/items/7f1d4a56-2b6f-4c1e-9a7d-0d2b8c1e5f00";
    let (status, body) = send(&app, Method::GET, missing, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NoSuchItem");

    let (status, _) = send(&app, Method::DELETE, missing, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_rejections() {
    let app = app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/items",
        Some(json!({ "kind": "dvd", "title": "Alien" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidKind");

    let (status, body) = send(
        &app,
        Method::POST,
        "/items",
        Some(json!({ "kind": "magazine", "title": "Byte", "issueNumber": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "MissingFields");
    assert_eq!(
        body["fields"],
        json!(["publisher", "issueNumber", "publicationDate"])
    );

    send(&app, Method::POST, "/items", Some(dune())).await;
    let (status, body) = send(&app, Method::POST, "/items", Some(dune())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["fields"], json!(["isbn"]));
}

#[tokio::test]
async fn test_legacy_item_type_field() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/items",
        Some(json!({
            "itemType": "Magazine",
            "title": "Byte",
            "publisher": "McGraw-Hill",
            "issueNumber": "12",
            "publicationDate": "1984-08-01"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["kind"], "magazine");
    assert_eq!(body["issueNumber"], 12);
    assert_eq!(body["publicationDate"], "1984-08-01");
}

#[tokio::test]
async fn test_update_and_delete() {
    let app = app();
    let (_, created) = send(&app, Method::POST, "/items", Some(dune())).await;
    let uri = format!("/items/{}", created["id"].as_str().expect("No item ID"));

    let (status, body) = send(&app, Method::PUT, &uri, Some(json!({ "kind": "magazine" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "ImmutableField");

    let (status, body) = send(&app, Method::PUT, &uri, Some(json!({ "title": "Dune Messiah" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Dune Messiah");
    assert_eq!(body["kind"], "book");
    assert_eq!(body["isbn"], "978-0");

    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, Method::GET, "/items", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_list_with_filter() {
    let app = app();
    send(&app, Method::POST, "/items", Some(dune())).await;
    send(
        &app,
        Method::POST,
        "/items",
        Some(json!({
            "kind": "magazine",
            "title": "Byte",
            "publisher": "McGraw-Hill",
            "issueNumber": 8,
            "publicationDate": "1984-08-01"
        })),
    )
    .await;

    let (_, all) = send(&app, Method::GET, "/items", None).await;
    assert_eq!(all.as_array().map(Vec::len), Some(2));

    let (_, hits) = send(&app, Method::GET, "/items?q=herbert", None).await;
    assert_eq!(hits.as_array().map(Vec::len), Some(1));
    assert_eq!(hits[0]["title"], "Dune");
}

#[tokio::test]
async fn test_create_body_type_errors_reach_validation() {
    let app = app();

    for body in [
        json!({ "title": "Dune" }),
        json!({ "kind": null, "title": "Dune" }),
    ] {
        let (status, body) = send(&app, Method::POST, "/items", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "InvalidKind");
    }

    for year in [json!(false), json!(1965.0)] {
        let mut book = dune();
        book["publishedYear"] = year;
        let (status, body) = send(&app, Method::POST, "/items", Some(book)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "MissingFields");
        assert_eq!(body["fields"], json!(["publishedYear"]));
    }

    let mut book = dune();
    book["title"] = json!(5);
    let (status, body) = send(&app, Method::POST, "/items", Some(book)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"], json!(["title"]));
}

#[tokio::test]
async fn test_malformed_json_body_gets_error_body() {
    let app = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/items")
        .header("content-type", "application/json")
        .body(Body::from("{\"kind\": \"book\","))
        .expect("Failed to build request");

    let response = app.oneshot(request).await.expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let body: Value = serde_json::from_slice(&bytes).expect("Failed to parse response");
    assert_eq!(body["error"], "BadValue");
}

#[tokio::test]
async fn test_update_to_taken_isbn_conflicts() {
    let app = app();
    send(&app, Method::POST, "/items", Some(dune())).await;
    let mut other = dune();
    other["isbn"] = json!("978-1");
    let (_, created) = send(&app, Method::POST, "/items", Some(other)).await;
    let uri = format!("/items/{}", created["id"].as_str().expect("No item ID"));

    let (status, body) = send(&app, Method::PUT, &uri, Some(json!({ "isbn": "978-0" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["fields"], json!(["isbn"]));

    let (_, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(body["isbn"], "978-1");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_borrows_single_winner() {
    let app = app();
    let (_, created) = send(&app, Method::POST, "/items", Some(dune())).await;
    let uri = format!("/items/{}/borrow", created["id"].as_str().expect("No item ID"));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let app = app.clone();
            let uri = uri.clone();
            tokio::spawn(async move { send(&app, Method::POST, &uri, None).await.0 })
        })
        .collect();

    let mut statuses = Vec::new();
    for handle in handles {
        statuses.push(handle.await.expect("Borrow task panicked"));
    }
    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::OK).count(), 1);
    assert_eq!(
        statuses.iter().filter(|s| **s == StatusCode::CONFLICT).count(),
        15
    );
}
