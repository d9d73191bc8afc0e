use super::{StoreError, TaskStore};
use crate::task::{Task, TaskId};
use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const RETRY_BASE_DELAY_MS: u64 = 250;
const RETRY_MAX_DELAY_MS: u64 = 2_000;

/// Connection settings for [`HttpTaskStore`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HttpStoreConfig {
    /// Base URL of the API, e.g. `http://localhost:5000/api`
    pub base_url: String,
    /// Per-request timeout; `None` keeps the platform default
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// How many times a retriable failure is repeated
    #[serde(default)]
    pub max_retries: u32,
}

impl Default for HttpStoreConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".to_string(),
            timeout_secs: None,
            max_retries: 0,
        }
    }
}

#[derive(Debug, Serialize)]
struct CreateTaskBody<'a> {
    task: &'a str,
}

#[derive(Debug, Serialize)]
struct UpdateTaskBody {
    completed: bool,
}

/// `GET /todo` answers either with the usual envelope or a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TodosBody {
    Envelope { data: Vec<Task> },
    Bare(Vec<Task>),
}

impl From<TodosBody> for Vec<Task> {
    fn from(body: TodosBody) -> Self {
        match body {
            TodosBody::Envelope { data } => data,
            TodosBody::Bare(tasks) => tasks,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Task store reached over HTTP/JSON.
#[derive(Debug, Clone)]
pub struct HttpTaskStore {
    client: reqwest::Client,
    base_url: Url,
    max_retries: u32,
}

impl HttpTaskStore {
    pub fn new(config: HttpStoreConfig) -> Result<Self, StoreError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(timeout));
        }
        let client = builder
            .build()
            .map_err(|err| StoreError::Request(err.to_string()))?;
        let base_url = Url::parse(config.base_url.trim_end_matches('/'))
            .map_err(|err| StoreError::Request(format!("{}: {}", config.base_url, err)))?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::Request(format!(
                "{} cannot carry a path",
                config.base_url
            )));
        }
        Ok(Self {
            client,
            base_url,
            max_retries: config.max_retries,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    fn collection_url(&self) -> Result<Url, StoreError> {
        self.url_with_segments(&["todo"])
    }

    /// `{base}/todo/{id}` with the id percent-encoded as one path segment.
    fn item_url(&self, id: &TaskId) -> Result<Url, StoreError> {
        self.url_with_segments(&["todo", id.as_str()])
    }

    fn url_with_segments(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Request(format!("{} cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Sends the request built by `build`, repeating it while the failure is
    /// retriable and the retry budget lasts.
    ///
    /// Transport failures are only repeated for idempotent requests: the
    /// server may have applied a request whose answer got lost.
    async fn send(
        &self,
        idempotent: bool,
        build: impl Fn() -> reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, StoreError> {
        let mut attempt = 0;
        loop {
            let result = match build().send().await {
                Ok(response) => check_status(response).await,
                Err(err) => Err(transport_error(err)),
            };
            match result {
                Err(err) if should_retry(&err, idempotent) && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = retry_delay(attempt);
                    tracing::warn!(
                        "Retrying task store request ({}/{}) in {:?}: {}",
                        attempt,
                        self.max_retries,
                        delay,
                        err
                    );
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }
}

fn should_retry(err: &StoreError, idempotent: bool) -> bool {
    match err {
        StoreError::Transport(_) => idempotent,
        other => other.is_retriable(),
    }
}

/// Linear backoff capped at [`RETRY_MAX_DELAY_MS`].
fn retry_delay(attempt: u32) -> Duration {
    Duration::from_millis((RETRY_BASE_DELAY_MS * attempt as u64).min(RETRY_MAX_DELAY_MS))
}

fn transport_error(err: reqwest::Error) -> StoreError {
    if err.is_builder() {
        StoreError::Request(err.to_string())
    } else {
        StoreError::Transport(err.to_string())
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|parsed| parsed.message)
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("unknown error").to_string()
            } else {
                body
            }
        });
    Err(StoreError::from_status(status.as_u16(), message))
}

#[async_trait]
impl TaskStore for HttpTaskStore {
    #[tracing::instrument(skip(self))]
    async fn fetch_all(&self) -> Result<Vec<Task>, StoreError> {
        let url = self.collection_url()?;
        let response = self.send(true, || self.client.get(url.clone())).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|err| StoreError::Transport(err.to_string()))?;
        let body: TodosBody =
            serde_json::from_slice(&bytes).map_err(|err| StoreError::Decode(err.to_string()))?;
        let tasks: Vec<Task> = body.into();
        tracing::debug!("Fetched {} tasks", tasks.len());
        Ok(tasks)
    }

    #[tracing::instrument(skip(self))]
    async fn create(&self, description: &str) -> Result<(), StoreError> {
        let url = self.collection_url()?;
        self.send(false, || {
            self.client
                .post(url.clone())
                .json(&CreateTaskBody { task: description })
        })
        .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn update(&self, id: &TaskId, completed: bool) -> Result<(), StoreError> {
        let url = self.item_url(id)?;
        self.send(true, || {
            self.client
                .put(url.clone())
                .json(&UpdateTaskBody { completed })
        })
        .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: &TaskId) -> Result<(), StoreError> {
        let url = self.item_url(id)?;
        self.send(true, || self.client.delete(url.clone())).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_trailing_slash_from_base_url() {
        let store = HttpTaskStore::new(HttpStoreConfig {
            base_url: "http://localhost:5000/api/".to_string(),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(
            store.collection_url().unwrap().as_str(),
            "http://localhost:5000/api/todo"
        );
        assert_eq!(
            store.item_url(&TaskId::new("7")).unwrap().as_str(),
            "http://localhost:5000/api/todo/7"
        );
    }

    #[test]
    fn item_url_encodes_id_as_one_segment() {
        let store = HttpTaskStore::new(HttpStoreConfig::default()).unwrap();

        let url = store.item_url(&TaskId::new("north/7?x#y")).unwrap();

        assert_eq!(url.as_str(), "http://localhost:5000/api/todo/north%2F7%3Fx%23y");
        assert_eq!(url.path_segments().unwrap().count(), 3);
    }

    #[test]
    fn rejects_unparsable_base_url() {
        let result = HttpTaskStore::new(HttpStoreConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        });

        assert!(matches!(result, Err(StoreError::Request(_))));
    }

    #[test]
    fn transport_failures_are_retried_only_for_idempotent_requests() {
        let lost = StoreError::Transport("connection reset".into());
        let busy = StoreError::from_status(503, "busy");
        let bad = StoreError::from_status(400, "bad");

        assert!(should_retry(&lost, true));
        assert!(!should_retry(&lost, false));
        assert!(should_retry(&busy, true));
        assert!(should_retry(&busy, false));
        assert!(!should_retry(&bad, true));
    }

    #[test]
    fn decodes_enveloped_and_bare_collections() {
        let envelope = r#"{"status": "success", "message": "Todos Fetched", "data": [{"id": 1, "task": "Weed", "completed": false}]}"#;
        let bare = r#"[{"id": "a", "task": "Plough", "completed": true}]"#;

        let from_envelope: Vec<Task> = serde_json::from_str::<TodosBody>(envelope).unwrap().into();
        let from_bare: Vec<Task> = serde_json::from_str::<TodosBody>(bare).unwrap().into();

        assert_eq!(from_envelope, vec![Task::new("1", "Weed")]);
        assert_eq!(from_bare, vec![Task::new("a", "Plough").completed(true)]);
    }

    #[test]
    fn rejects_body_without_tasks() {
        let result = serde_json::from_str::<TodosBody>(r#"{"message": "Todos Fetched"}"#);

        assert!(result.is_err());
    }

    #[test]
    fn retry_delay_grows_linearly_and_is_capped() {
        assert_eq!(retry_delay(1), Duration::from_millis(250));
        assert_eq!(retry_delay(3), Duration::from_millis(750));
        assert_eq!(retry_delay(50), Duration::from_millis(2_000));
    }

    #[test]
    fn request_bodies_use_wire_keys() {
        assert_eq!(
            serde_json::to_value(CreateTaskBody { task: "Sow maize" }).unwrap(),
            serde_json::json!({"task": "Sow maize"})
        );
        assert_eq!(
            serde_json::to_value(UpdateTaskBody { completed: true }).unwrap(),
            serde_json::json!({"completed": true})
        );
    }
}
