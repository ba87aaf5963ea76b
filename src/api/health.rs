use crate::api::AppState;
use crate::error::AppError;
use axum::{extract::State, Json};
use tracing::warn;

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Ready once the database answers a trivial query.
pub async fn ready(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    state.repo.ping().await.map_err(|e| {
        warn!(error = %e, "Readiness check failed");
        AppError::Unavailable(e.to_string())
    })?;
    Ok(Json(serde_json::json!({"status": "ready"})))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_db, Repository};
    use crate::schema::library_schema;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_health_returns_ok() {
        let Json(body) = health().await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_ready_returns_ready() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .to_string();
        let pool = init_db(&db_path).await.unwrap();
        let state = AppState::new(Arc::new(Repository::new(pool)), library_schema());

        let Json(body) = ready(State(state)).await.unwrap();
        assert_eq!(body["status"], "ready");
    }

    #[tokio::test]
    async fn test_ready_fails_on_closed_pool() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .to_string();
        let pool = init_db(&db_path).await.unwrap();
        pool.close().await;
        let state = AppState::new(Arc::new(Repository::new(pool)), library_schema());

        assert!(matches!(
            ready(State(state)).await,
            Err(AppError::Unavailable(_))
        ));
    }
}
