pub mod health;
pub mod schema;

use crate::db::Repository;
use crate::schema::Schema;
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub schema: Arc<Schema>,
}

impl AppState {
    pub fn new(repo: Arc<Repository>, schema: Schema) -> Self {
        Self {
            repo,
            schema: Arc::new(schema),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/schema", get(schema::get_schema))
        .layer(cors)
        .with_state(state)
}
