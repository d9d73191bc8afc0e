use axum::Router;
use std::sync::Arc;
use todo_list::{InMemoryTaskStore, TaskStore};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::todo::{TodoState, create_todo_router};

/// Builds the application router: `/health` plus the task routes under `/api`.
pub fn create_app(state: TodoState) -> Router {
    let api_routes = create_todo_router(state);
    Router::new()
        .route("/health", axum::routing::get(health_check_handler))
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                // The browser front end is served from a different origin.
                .layer(CorsLayer::permissive()),
        )
}

/// Picks the task store described by `config`.
pub fn create_store(config: &Config) -> Arc<dyn TaskStore> {
    if config.seed_demo_tasks {
        tracing::info!("Seeding task store with demo tasks");
        Arc::new(InMemoryTaskStore::with_demo_tasks())
    } else {
        Arc::new(InMemoryTaskStore::new())
    }
}

#[tracing::instrument(skip(config))]
pub async fn start_web_server(config: Config) -> anyhow::Result<()> {
    let server_address = format!("0.0.0.0:{}", &config.port);
    let listener = tokio::net::TcpListener::bind(&server_address).await?;
    tracing::info!("Web server running on http://{}", server_address);

    let app = create_app(TodoState::new(create_store(&config)));

    axum::serve(listener, app).await?;
    Ok(())
}

#[tracing::instrument]
pub async fn health_check_handler() -> &'static str {
    "OK"
}
