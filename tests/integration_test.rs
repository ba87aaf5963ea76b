use axum::http::StatusCode;
use libris::api::{self, AppState};
use libris::db::init_db;
use libris::{library_schema, Repository};
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

async fn setup_test_app() -> (axum::Router, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();

    let pool = init_db(&db_path).await.expect("init_db failed");
    let repo = Arc::new(Repository::new(pool));
    let state = AppState::new(repo, library_schema());

    (api::create_router(state), temp_dir)
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = axum::http::Request::builder()
        .method("GET")
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _temp) = setup_test_app().await;
    let (status, body) = get(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_ready_endpoint() {
    let (app, _temp) = setup_test_app().await;
    let (status, body) = get(app, "/ready").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_schema_endpoint_lists_tables_and_rules() {
    let (app, _temp) = setup_test_app().await;
    let (status, body) = get(app, "/v1/schema").await;

    assert_eq!(status, StatusCode::OK);

    let tables = body["tables"].as_array().expect("tables array");
    assert_eq!(tables.len(), library_schema().tables.len());

    let details = tables
        .iter()
        .find(|t| t["name"] == "book_borrow_details")
        .expect("book_borrow_details table");
    let borrow_fk = details["foreign_keys"]
        .as_array()
        .unwrap()
        .iter()
        .find(|fk| fk["column"] == "borrow_id")
        .expect("borrow_id foreign key");
    assert_eq!(borrow_fk["references_table"], "book_borrows");
    assert_eq!(borrow_fk["on_delete"], "cascade");

    let logs = tables
        .iter()
        .find(|t| t["name"] == "library_logs")
        .expect("library_logs table");
    let status_column = logs["columns"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["name"] == "status")
        .expect("status column");
    assert_eq!(status_column["default"]["kind"], "text");
    assert_eq!(status_column["default"]["value"], "Pending");
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let (app, _temp) = setup_test_app().await;

    let request = axum::http::Request::builder()
        .method("GET")
        .uri("/v1/loans")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
