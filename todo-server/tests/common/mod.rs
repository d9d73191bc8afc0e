use std::sync::Arc;
use todo_list::{InMemoryTaskStore, TaskStore};
use todo_server::todo::TodoState;
use todo_server::web::create_app;

/// Serves the application on an ephemeral local port.
///
/// Returns the API base URL, e.g. `http://127.0.0.1:40123/api`.
#[allow(dead_code)]
pub async fn spawn_server(store: Arc<dyn TaskStore>) -> anyhow::Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let address = listener.local_addr()?;
    let app = create_app(TodoState::new(store));
    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            tracing::error!("Test server stopped: {}", err);
        }
    });
    Ok(format!("http://{}/api", address))
}

/// Store seeded with the given descriptions, all open.
#[allow(dead_code)]
pub fn seeded_store(descriptions: &[&str]) -> Arc<InMemoryTaskStore> {
    let store = InMemoryTaskStore::new();
    for description in descriptions {
        store.insert(description);
    }
    Arc::new(store)
}
