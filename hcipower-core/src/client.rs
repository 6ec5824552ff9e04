//! HTTP client for the management service
//!
//! Implements the service contracts over a JSON REST API.

use async_trait::async_trait;
use hcipower_common::{
    ClusterRef, Error, HostRef, PowerActionRequest, Result, TaskHandle, TaskStatus,
};
use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::ManagementConfig;
use crate::precheck::moref::ManagedObjectRef;
use crate::service::{
    HealthQuery, HostInventory, HostRuntimeStats, HostStatsMap, PowerActions, StatusQueryError,
    TaskStatusQuery,
};

/// Transport-level failure, before it is mapped onto the orchestration taxonomy
#[derive(Debug, thiserror::Error)]
enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: StatusCode, message: String },
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    /// Whether the endpoint itself is gone, as opposed to refusing the request.
    /// Any transport failure counts, including a connection dropped mid-request.
    fn is_unreachable(&self) -> bool {
        match self {
            Self::Http(e) => !e.is_builder(),
            Self::Api { status, .. } => is_unavailable_status(*status),
            Self::Decode(_) => false,
        }
    }
}

fn is_unavailable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
    )
}

#[derive(Debug, Deserialize)]
struct HostStatsEntry {
    host: HostRef,
    #[serde(default)]
    stats: Option<HostRuntimeStats>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SubmitResponse {
    task: TaskHandle,
}

/// Management service client
#[derive(Clone)]
pub struct ManagementClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ManagementClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Service(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn from_config(config: &ManagementConfig) -> Result<Self> {
        let client = Self::new(&config.server, Duration::from_secs(config.request_timeout_secs))?;
        Ok(match config.token {
            Some(ref token) => client.with_token(token),
            None => client,
        })
    }

    /// Set authentication token
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let request = self.client.request(method, self.url(path));
        match self.token {
            Some(ref token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> std::result::Result<T, ClientError> {
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Api { status, message });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> std::result::Result<T, ClientError> {
        debug!(path = %path, "GET");
        self.send(self.request(reqwest::Method::GET, path)).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> std::result::Result<T, ClientError> {
        debug!(path = %path, "POST");
        self.send(self.request(reqwest::Method::POST, path).json(body)).await
    }
}

fn cluster_path(cluster: &ClusterRef, suffix: &str) -> String {
    format!(
        "/api/clusters/{}/{}",
        urlencoding::encode(cluster.as_str()),
        suffix
    )
}

fn service_error(e: ClientError) -> Error {
    Error::Service(e.to_string())
}

#[async_trait]
impl HealthQuery for ManagementClient {
    async fn query_health_summary(
        &self,
        cluster: &ClusterRef,
        category: &str,
    ) -> Result<serde_json::Value> {
        let path = format!(
            "{}?category={}",
            cluster_path(cluster, "health"),
            urlencoding::encode(category)
        );
        self.get(&path).await.map_err(service_error)
    }
}

#[async_trait]
impl HostInventory for ManagementClient {
    async fn query_host_runtime_stats(&self, cluster: &ClusterRef) -> Result<HostStatsMap> {
        let entries: Vec<HostStatsEntry> = self
            .get(&cluster_path(cluster, "hosts/stats"))
            .await
            .map_err(service_error)?;

        Ok(entries.into_iter().map(|e| (e.host, e.stats)).collect())
    }

    async fn resolve_host(&self, reference: &ManagedObjectRef) -> Result<HostRef> {
        let path = format!(
            "/api/hosts/{}/{}",
            urlencoding::encode(&reference.object_type),
            urlencoding::encode(&reference.object_id)
        );
        self.get(&path).await.map_err(service_error)
    }
}

#[async_trait]
impl PowerActions for ManagementClient {
    async fn submit_power_action(
        &self,
        cluster: &ClusterRef,
        request: &PowerActionRequest,
    ) -> Result<TaskHandle> {
        let response: SubmitResponse = self
            .post(&cluster_path(cluster, "power"), request)
            .await
            .map_err(|e| Error::Invocation(e.to_string()))?;
        Ok(response.task)
    }
}

#[async_trait]
impl TaskStatusQuery for ManagementClient {
    async fn query_task_status(
        &self,
        task: &TaskHandle,
    ) -> std::result::Result<TaskStatus, StatusQueryError> {
        let path = format!("/api/tasks/{}", urlencoding::encode(task.as_str()));
        self.get(&path).await.map_err(|e| {
            if e.is_unreachable() {
                StatusQueryError::Unreachable(e.to_string())
            } else {
                StatusQueryError::Other(e.to_string())
            }
        })
    }
}
