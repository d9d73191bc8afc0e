use super::TodoState;
use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use todo_list::{StoreError, Task, TaskId};

/// Success envelope shared by every task route.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    status: &'static str,
    message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(message: &'static str, data: Option<T>) -> Json<Self> {
        Json(Self {
            status: "success",
            message,
            data,
        })
    }
}

/// JSON body returned for failed requests.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct AddTodoRequest {
    task: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTodoRequest {
    completed: bool,
}

#[derive(Debug, Deserialize)]
pub struct DeleteTodoQuery {
    id: Option<String>,
}

/// Errors raised by the task routes.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Task description must not be empty")]
    MissingTask,
    #[error("Task id is required")]
    MissingId,
    #[error("Invalid request body: {0}")]
    InvalidBody(#[from] JsonRejection),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status_code = match &self {
            ApiError::MissingTask | ApiError::MissingId => StatusCode::BAD_REQUEST,
            ApiError::InvalidBody(rejection) => rejection.status(),
            ApiError::Store(StoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Store(StoreError::Client { status, .. }) => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_REQUEST)
            }
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = match &self {
            ApiError::Store(StoreError::NotFound { message, .. })
            | ApiError::Store(StoreError::Client { message, .. }) => message.clone(),
            ApiError::InvalidBody(rejection) => {
                format!("Invalid request body: {}", rejection.body_text())
            }
            ApiError::Store(err) => {
                tracing::error!("Task store failure: {}", err);
                "An unexpected error occurred while processing your request. Please try again later."
                    .to_string()
            }
            other => other.to_string(),
        };
        (
            status_code,
            Json(ErrorResponse {
                status: "error".to_string(),
                message,
            }),
        )
            .into_response()
    }
}

/// Handler for GET /todo - returns the whole collection.
#[tracing::instrument(skip(state))]
pub async fn get_todos_handler(
    State(state): State<TodoState>,
) -> Result<Json<ApiResponse<Vec<Task>>>, ApiError> {
    let tasks = state.store.fetch_all().await?;
    Ok(ApiResponse::success("Todos Fetched", Some(tasks)))
}

/// Handler for POST /todo - creates a task from `{"task": ...}`.
#[tracing::instrument(skip(state))]
pub async fn add_todo_handler(
    State(state): State<TodoState>,
    WithRejection(Json(request), _): WithRejection<Json<AddTodoRequest>, ApiError>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let task = request
        .task
        .filter(|task| !task.trim().is_empty())
        .ok_or(ApiError::MissingTask)?;
    state.store.create(&task).await?;
    Ok(ApiResponse::success("Task Added", None))
}

/// Handler for PUT /todo/{id} - sets `completed`.
#[tracing::instrument(skip(state))]
pub async fn update_todo_handler(
    State(state): State<TodoState>,
    Path(id): Path<String>,
    WithRejection(Json(request), _): WithRejection<Json<UpdateTodoRequest>, ApiError>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state
        .store
        .update(&TaskId::new(id), request.completed)
        .await?;
    Ok(ApiResponse::success("Task Updated", None))
}

/// Handler for DELETE /todo/{id}.
#[tracing::instrument(skip(state))]
pub async fn delete_todo_handler(
    State(state): State<TodoState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.store.delete(&TaskId::new(id)).await?;
    Ok(ApiResponse::success("Task Deleted", None))
}

/// Handler for DELETE /todo?id=... kept for older clients.
#[tracing::instrument(skip(state))]
pub async fn delete_todo_by_query_handler(
    State(state): State<TodoState>,
    Query(query): Query<DeleteTodoQuery>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = query
        .id
        .filter(|id| !id.is_empty())
        .ok_or(ApiError::MissingId)?;
    state.store.delete(&TaskId::new(id)).await?;
    Ok(ApiResponse::success("Task Deleted", None))
}

/// Creates and returns the task collection router.
pub fn create_todo_router(state: TodoState) -> Router {
    Router::new()
        .route(
            "/todo",
            get(get_todos_handler)
                .post(add_todo_handler)
                .delete(delete_todo_by_query_handler),
        )
        .route(
            "/todo/{id}",
            put(update_todo_handler).delete(delete_todo_handler),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn not_found_store_error_maps_to_404() {
        // Arrange
        let error = ApiError::Store(StoreError::from_status(404, "Task 9 not found"));

        // Act
        let response = error.into_response();

        // Assert
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"status": "error", "message": "Task 9 not found"})
        );
    }

    #[tokio::test]
    async fn unexpected_store_error_hides_details() {
        let error = ApiError::Store(StoreError::Transport("database socket closed".into()));

        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(
            body["message"],
            "An unexpected error occurred while processing your request. Please try again later."
        );
    }

    #[tokio::test]
    async fn missing_task_maps_to_400() {
        let response = ApiError::MissingTask.into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["message"],
            "Task description must not be empty"
        );
    }

    #[test]
    fn success_envelope_omits_missing_data() {
        let Json(response) = ApiResponse::<()>::success("Task Added", None);

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            serde_json::json!({"status": "success", "message": "Task Added"})
        );
    }
}
