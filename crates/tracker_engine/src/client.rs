use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Url;
use serde::de::DeserializeOwned;
use tracker_logging::tracker_trace;

use crate::{BatchStatusResponse, ClientError, SystemStatus, TaskStatusResponse};

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_body_bytes: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// The task-tracking HTTP API, as far as the tracker depends on it.
#[async_trait::async_trait]
pub trait StatusClient: Send + Sync {
    async fn batch_status(&self, batch_id: &str) -> Result<BatchStatusResponse, ClientError>;

    async fn task_status(&self, task_id: &str) -> Result<TaskStatusResponse, ClientError>;

    async fn system_status(&self) -> Result<SystemStatus, ClientError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestStatusClient {
    base_url: Url,
    max_body_bytes: u64,
    client: reqwest::Client,
}

impl ReqwestStatusClient {
    pub fn new(settings: ClientSettings) -> Result<Self, ClientError> {
        let base_url = Url::parse(&settings.base_url)
            .map_err(|err| ClientError::InvalidUrl(format!("{}: {err}", settings.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(settings.base_url));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ClientError::Network(err.to_string()))?;
        Ok(Self {
            base_url,
            max_body_bytes: settings.max_body_bytes,
            client,
        })
    }

    /// Appends percent-encoded path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ClientError> {
        let url = self.endpoint(segments)?;
        tracker_trace!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::HttpStatus(status.as_u16()));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.max_body_bytes {
                return Err(ClientError::TooLarge {
                    max_bytes: self.max_body_bytes,
                    actual: Some(content_len),
                });
            }
        }

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = body.len() as u64 + chunk.len() as u64;
            if next_len > self.max_body_bytes {
                return Err(ClientError::TooLarge {
                    max_bytes: self.max_body_bytes,
                    actual: Some(next_len),
                });
            }
            body.extend_from_slice(&chunk);
        }

        serde_json::from_slice(&body).map_err(|err| ClientError::Decode(err.to_string()))
    }
}

#[async_trait::async_trait]
impl StatusClient for ReqwestStatusClient {
    async fn batch_status(&self, batch_id: &str) -> Result<BatchStatusResponse, ClientError> {
        self.get_json(&["api", "batch", batch_id]).await
    }

    async fn task_status(&self, task_id: &str) -> Result<TaskStatusResponse, ClientError> {
        self.get_json(&["api", "task", task_id]).await
    }

    async fn system_status(&self) -> Result<SystemStatus, ClientError> {
        self.get_json(&["api", "status"]).await
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        return ClientError::Timeout(err.to_string());
    }
    ClientError::Network(err.to_string())
}
