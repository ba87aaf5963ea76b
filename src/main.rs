use libris::db::run_migrations;
use libris::{api, config::Config, library_schema, AppError, ConnectionProvider, Repository};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let result = match Config::from_env() {
        Ok(config) => run(&config).await,
        Err(e) => Err(AppError::from(e)),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

async fn run(config: &Config) -> Result<(), AppError> {
    let provider = ConnectionProvider::from_config(config)?;

    let result = serve(config, &provider).await;

    // The pool lives exactly as long as the server.
    provider.close().await;
    result
}

async fn serve(config: &Config, provider: &ConnectionProvider) -> Result<(), AppError> {
    let pool = provider.pool().await?;
    run_migrations(pool).await?;

    let repo = Arc::new(Repository::new(pool.clone()));
    let app = api::create_router(api::AppState::new(repo, library_schema()));

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to bind to {}: {}", addr, e)))?;

    tracing::info!(connection = provider.name(), "Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[tokio::test]
    async fn test_unknown_connection_name_fails_as_config_error() {
        let mut env_map = HashMap::new();
        env_map.insert("DATABASE_CONNECTION".to_string(), "Archive".to_string());
        let config = Config::from_env_map(env_map).unwrap();

        match run(&config).await {
            Err(AppError::Config(msg)) => assert!(msg.contains("Archive")),
            other => panic!("Expected config error, got {:?}", other),
        }
    }
}
