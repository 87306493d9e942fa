//! Integration tests for the Books API.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use crate::config::Config;
use crate::db::{init_database, Repository};
use crate::store::BookStore;
use crate::{create_router, AppState};

const TEST_KEY: &str = "test-api-key";

fn test_config(api_key: Option<String>) -> Config {
    Config {
        api_key,
        db_path: None,
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        log_level: "warn".to_string(),
        log_json: false,
        seed_demo: false,
    }
}

fn test_state(store: BookStore, api_key: Option<&str>) -> AppState {
    AppState {
        store: Arc::new(store),
        config: Arc::new(test_config(api_key.map(str::to_string))),
    }
}

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
}

impl TestFixture {
    async fn new() -> Self {
        Self::with_store(BookStore::new()).await
    }

    async fn with_store(store: BookStore) -> Self {
        let app = create_router(test_state(store, Some(TEST_KEY)));

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("x-api-key", TEST_KEY.parse().unwrap());

        TestFixture {
            client: Client::builder().default_headers(headers).build().unwrap(),
            base_url,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn create(&self, body: Value) -> Value {
        let resp = self
            .client
            .post(self.url("/api/books"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
        resp.json().await.unwrap()
    }

    async fn get_json(&self, path: &str) -> (u16, Value) {
        let resp = self.client.get(self.url(path)).send().await.unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_root_points_to_books() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get_json("/").await;
    assert_eq!(status, 200);
    assert_eq!(body["books"], "/api/books");
}

#[tokio::test]
async fn test_book_crud() {
    let fixture = TestFixture::new().await;

    // Create
    let created = fixture
        .create(json!({
            "title": "Мастер и Маргарита",
            "author": "Михаил Булгаков",
            "year": 1967,
            "isbn": "9785170123456"
        }))
        .await;
    assert_eq!(created["id"], 1);
    assert_eq!(created["title"], "Мастер и Маргарита");

    // Get
    let (status, fetched) = fixture.get_json("/api/books/1").await;
    assert_eq!(status, 200);
    assert_eq!(fetched, created);

    // Full update drops the isbn it does not mention
    let update_resp = fixture
        .client
        .put(fixture.url("/api/books/1"))
        .json(&json!({ "id": 42, "title": "Собачье сердце", "author": "Михаил Булгаков", "year": 1925 }))
        .send()
        .await
        .unwrap();
    assert_eq!(update_resp.status(), 200);
    let updated: Value = update_resp.json().await.unwrap();
    assert_eq!(updated["id"], 1);
    assert_eq!(updated["title"], "Собачье сердце");
    assert!(updated["isbn"].is_null());

    // Partial update
    let patch_resp = fixture
        .client
        .patch(fixture.url("/api/books/1"))
        .json(&json!({ "year": 1926 }))
        .send()
        .await
        .unwrap();
    assert_eq!(patch_resp.status(), 200);
    let patched: Value = patch_resp.json().await.unwrap();
    assert_eq!(patched["year"], 1926);
    assert_eq!(patched["title"], "Собачье сердце");

    // Delete
    let delete_resp = fixture
        .client
        .delete(fixture.url("/api/books/1"))
        .send()
        .await
        .unwrap();
    assert_eq!(delete_resp.status(), 204);
    assert!(delete_resp.text().await.unwrap().is_empty());

    // Verify deleted
    let (status, body) = fixture.get_json("/api/books/1").await;
    assert_eq!(status, 404);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    // Second delete fails
    let again = fixture
        .client
        .delete(fixture.url("/api/books/1"))
        .send()
        .await
        .unwrap();
    assert_eq!(again.status(), 404);
}

#[tokio::test]
async fn test_list_filter_and_stats_example() {
    let fixture = TestFixture::new().await;

    let a = fixture
        .create(json!({ "title": "A", "author": "X", "year": 2000 }))
        .await;
    let b = fixture
        .create(json!({ "title": "B", "author": "X", "year": 1995 }))
        .await;
    fixture
        .create(json!({ "title": "C", "author": "Y", "year": 1990 }))
        .await;

    let (status, list) = fixture.get_json("/api/books?author=x").await;
    assert_eq!(status, 200);
    let ids: Vec<i64> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![a["id"].as_i64().unwrap(), b["id"].as_i64().unwrap()]);

    let (_, ranged) = fixture
        .get_json("/api/books?year_from=1991&year_to=1999")
        .await;
    assert_eq!(ranged.as_array().unwrap().len(), 1);
    assert_eq!(ranged[0]["title"], "B");

    let (status, stats) = fixture.get_json("/api/books/stats").await;
    assert_eq!(status, 200);
    assert_eq!(stats["total_books"], 3);
    assert_eq!(stats["books_by_author"]["X"], 2);
    assert_eq!(stats["books_by_century"]["21 век"], 1);
    assert_eq!(stats["books_by_century"]["20 век"], 2);
}

#[tokio::test]
async fn test_list_pagination() {
    let fixture = TestFixture::new().await;

    for i in 0..15 {
        fixture
            .create(json!({ "title": format!("Book {}", i + 1), "author": "Z", "year": 1950 + i }))
            .await;
    }

    let (_, default_page) = fixture.get_json("/api/books").await;
    assert_eq!(default_page.as_array().unwrap().len(), 10);

    let (_, tail) = fixture.get_json("/api/books?skip=12&limit=5").await;
    let tail = tail.as_array().unwrap();
    assert_eq!(tail.len(), 3);
    assert_eq!(tail[0]["id"], 13);

    let (_, past_end) = fixture.get_json("/api/books?skip=40").await;
    assert!(past_end.as_array().unwrap().is_empty());

    let (status, body) = fixture.get_json("/api/books?limit=0").await;
    assert_eq!(status, 422);
    assert_eq!(body["error"]["details"]["fields"][0]["field"], "limit");

    let (status, _) = fixture.get_json("/api/books?skip=-1").await;
    assert_eq!(status, 422);
}

#[tokio::test]
async fn test_stats_route_is_not_an_id() {
    let fixture = TestFixture::new().await;

    let (status, stats) = fixture.get_json("/api/books/stats").await;
    assert_eq!(status, 200);
    assert_eq!(stats["total_books"], 0);

    let (status, body) = fixture.get_json("/api/books/abc").await;
    assert_eq!(status, 422);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_validation_errors() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/books"))
        .json(&json!({ "title": "", "author": "", "year": 999, "isbn": "123" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 422);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    let fields: Vec<&str> = body["error"]["details"]["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["title", "author", "year", "isbn"]);

    // Wrong types never reach validation but still use the envelope
    let resp = fixture
        .client
        .post(fixture.url("/api/books"))
        .json(&json!({ "title": "A", "author": "X", "year": "two thousand" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 422);

    // Rejected requests do not consume ids
    let created = fixture
        .create(json!({ "title": "A", "author": "X", "year": 2000 }))
        .await;
    assert_eq!(created["id"], 1);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/books"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_patch_isbn_null_clears_value() {
    let fixture = TestFixture::new().await;

    fixture
        .create(json!({ "title": "A", "author": "X", "year": 2000, "isbn": "1234567890" }))
        .await;

    let kept: Value = fixture
        .client
        .patch(fixture.url("/api/books/1"))
        .json(&json!({ "title": "A2" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(kept["isbn"], "1234567890");

    let cleared: Value = fixture
        .client
        .patch(fixture.url("/api/books/1"))
        .json(&json!({ "isbn": null }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(cleared["isbn"].is_null());
    assert_eq!(cleared["title"], "A2");
}

#[tokio::test]
async fn test_update_missing_book() {
    let fixture = TestFixture::new().await;

    let put = fixture
        .client
        .put(fixture.url("/api/books/77"))
        .json(&json!({ "title": "A", "author": "X", "year": 2000 }))
        .send()
        .await
        .unwrap();
    assert_eq!(put.status(), 404);

    let patch = fixture
        .client
        .patch(fixture.url("/api/books/77"))
        .json(&json!({ "year": 2001 }))
        .send()
        .await
        .unwrap();
    assert_eq!(patch.status(), 404);
}

#[tokio::test]
async fn test_gate_rejects_missing_key() {
    let app = create_router(test_state(BookStore::new(), Some("secret-key")));

    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/books")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"title":"A","author":"X","year":2000}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_gate_rejects_wrong_key_on_every_write() {
    let state = test_state(BookStore::new(), Some("correct-key"));
    state
        .store
        .create(crate::models::BookPayload {
            title: "A".to_string(),
            author: "X".to_string(),
            year: 2000,
            isbn: None,
        })
        .await
        .unwrap();
    let app = create_router(state.clone());

    for (method, uri, body) in [
        ("POST", "/api/books", r#"{"title":"B","author":"X","year":2000}"#),
        ("PUT", "/api/books/1", r#"{"title":"B","author":"X","year":2000}"#),
        ("PATCH", "/api/books/1", r#"{"year":2001}"#),
        ("DELETE", "/api/books/1", ""),
    ] {
        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .header("content-type", "application/json")
                    .header("x-api-key", "wrong-key")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN, "{method} {uri}");
    }

    // Nothing changed behind the gate
    let book = state.store.get(1).await.unwrap();
    assert_eq!(book.title, "A");
    assert_eq!(book.year, 2000);
    assert_eq!(state.store.len().await, 1);
}

#[tokio::test]
async fn test_reads_are_not_gated() {
    let app = create_router(test_state(BookStore::new(), Some("secret-key")));

    for uri in ["/api/books", "/api/books/stats"] {
        let resp = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "{uri}");
    }
}

#[tokio::test]
async fn test_gate_disabled_without_key() {
    let app = create_router(test_state(BookStore::new(), None));

    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/books")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"title":"A","author":"X","year":2000}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_persisted_books_survive_restart() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.sqlite");

    {
        let pool = init_database(&db_path).await.expect("Failed to init DB");
        let store = BookStore::open(Repository::new(pool)).await.unwrap();
        let fixture = TestFixture::with_store(store).await;
        fixture
            .create(json!({ "title": "A", "author": "X", "year": 2000 }))
            .await;
        fixture
            .create(json!({ "title": "B", "author": "X", "year": 1995 }))
            .await;
        let resp = fixture
            .client
            .delete(fixture.url("/api/books/2"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 204);
    }

    let pool = init_database(&db_path).await.expect("Failed to init DB");
    let store = BookStore::open(Repository::new(pool)).await.unwrap();
    let fixture = TestFixture::with_store(store).await;

    let (_, list) = fixture.get_json("/api/books").await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["title"], "A");

    let created = fixture
        .create(json!({ "title": "C", "author": "Y", "year": 1990 }))
        .await;
    assert_eq!(created["id"], 3);
}
