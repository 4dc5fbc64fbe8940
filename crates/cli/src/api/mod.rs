use std::collections::BTreeMap;

use async_trait::async_trait;
use common::api::{ConnectorStatusResponse, ErrorBody, TaskDescriptor, ValidationResponse};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::config_file::coerce_scalar;

pub type ConfigMap = BTreeMap<String, String>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{}", render_coordinator_error(*status, body))]
    Status { status: StatusCode, body: String },
    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },
    #[error("cannot build request URL from {url}: {message}")]
    InvalidUrl { url: String, message: String },
}

impl ApiError {
    /// Transport failures, 5xx, 429 and 409 (rebalance in progress) may
    /// succeed on a later attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Transport { .. } => true,
            ApiError::Status { status, .. } => {
                status.is_server_error()
                    || *status == StatusCode::TOO_MANY_REQUESTS
                    || *status == StatusCode::CONFLICT
            }
            ApiError::Decode { .. } | ApiError::InvalidUrl { .. } => false,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result of looking up the deployed config of a connector.
#[derive(Debug, Clone, PartialEq)]
pub enum DeployedConfig {
    Found(ConfigMap),
    Error(ErrorBody),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlVerb {
    Pause,
    Resume,
    Restart,
    Delete,
}

impl ControlVerb {
    pub fn method(&self) -> Method {
        match self {
            ControlVerb::Pause | ControlVerb::Resume => Method::PUT,
            ControlVerb::Restart => Method::POST,
            ControlVerb::Delete => Method::DELETE,
        }
    }

    pub fn sub_path(&self) -> &'static str {
        match self {
            ControlVerb::Pause => "pause",
            ControlVerb::Resume => "resume",
            ControlVerb::Restart => "restart",
            ControlVerb::Delete => "",
        }
    }
}

/// Typed access to the coordinator REST API. One call is one request; retry
/// policy lives with the callers.
#[async_trait]
pub trait FleetClient: Send + Sync {
    async fn list_connector_names(&self) -> Result<Vec<String>, ApiError>;

    async fn connector_status(&self, name: &str) -> Result<ConnectorStatusResponse, ApiError>;

    async fn connector_config(&self, name: &str) -> Result<DeployedConfig, ApiError>;

    /// Task configs keyed by task id.
    async fn connector_tasks(&self, name: &str) -> Result<BTreeMap<i32, ConfigMap>, ApiError>;

    async fn validate_plugin_config(
        &self,
        plugin_class: &str,
        config: &ConfigMap,
    ) -> Result<ValidationResponse, ApiError>;

    async fn put_config(&self, name: &str, config: &ConfigMap) -> Result<StatusCode, ApiError>;

    async fn control(&self, name: &str, verb: ControlVerb) -> Result<StatusCode, ApiError>;

    async fn control_task(
        &self,
        name: &str,
        task_id: i32,
        verb: ControlVerb,
    ) -> Result<StatusCode, ApiError>;
}

#[derive(Clone)]
pub struct ConnectApi {
    client: Client,
    base: String,
}

impl ConnectApi {
    pub fn new(client: Client, base: impl Into<String>) -> Self {
        Self {
            client,
            base: base.into(),
        }
    }

    /// Appends `segments` to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let invalid = |message: String| ApiError::InvalidUrl {
            url: self.base.clone(),
            message,
        };
        let mut url = Url::parse(&self.base).map_err(|err| invalid(err.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| invalid("URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, url: &Url, req: RequestBuilder) -> Result<Response, ApiError> {
        req.send().await.map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })
    }

    async fn get<T>(&self, segments: &[&str]) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments)?;
        debug!(%url, "GET");
        let res = self.send(&url, self.client.get(url.clone())).await?;
        decode_json(url.as_str(), ensure_success(res).await?).await
    }

    async fn send_for_status(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&ConfigMap>,
    ) -> Result<StatusCode, ApiError> {
        let url = self.endpoint(segments)?;
        debug!(%method, %url, "sending control request");
        let mut req = self.client.request(method, url.clone());
        if let Some(body) = body {
            req = req.json(body);
        }
        let res = ensure_success(self.send(&url, req).await?).await?;
        let status = res.status();
        let _ = res.bytes().await;
        Ok(status)
    }
}

#[async_trait]
impl FleetClient for ConnectApi {
    async fn list_connector_names(&self) -> Result<Vec<String>, ApiError> {
        self.get(&["connectors"]).await
    }

    async fn connector_status(&self, name: &str) -> Result<ConnectorStatusResponse, ApiError> {
        self.get(&["connectors", name, "status"]).await
    }

    async fn connector_config(&self, name: &str) -> Result<DeployedConfig, ApiError> {
        let url = self.endpoint(&["connectors", name, "config"])?;
        debug!(%url, "GET");
        let res = self.send(&url, self.client.get(url.clone())).await?;
        let status = res.status();
        let body = res.text().await.map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;

        let value = match serde_json::from_str::<Value>(&body) {
            Ok(value) => value,
            Err(err) if status.is_success() => {
                return Err(ApiError::Decode {
                    url: url.to_string(),
                    message: err.to_string(),
                });
            }
            Err(_) => return Err(ApiError::Status { status, body }),
        };

        if let Some(error) = error_body(&value) {
            return Ok(DeployedConfig::Error(error));
        }
        if !status.is_success() {
            return Err(ApiError::Status { status, body });
        }
        config_map_from_value(&value)
            .map(DeployedConfig::Found)
            .ok_or_else(|| ApiError::Decode {
                url: url.to_string(),
                message: "config is not a JSON object".to_string(),
            })
    }

    async fn connector_tasks(&self, name: &str) -> Result<BTreeMap<i32, ConfigMap>, ApiError> {
        let tasks: Vec<TaskDescriptor> = self.get(&["connectors", name, "tasks"]).await?;
        Ok(tasks
            .into_iter()
            .map(|task| (task.id.task, task.config))
            .collect())
    }

    async fn validate_plugin_config(
        &self,
        plugin_class: &str,
        config: &ConfigMap,
    ) -> Result<ValidationResponse, ApiError> {
        let url = self.endpoint(&["connector-plugins", plugin_class, "config", "validate"])?;
        debug!(%url, "validating plugin config");
        let res = self.send(&url, self.client.put(url.clone()).json(config)).await?;
        decode_json(url.as_str(), ensure_success(res).await?).await
    }

    async fn put_config(&self, name: &str, config: &ConfigMap) -> Result<StatusCode, ApiError> {
        self.send_for_status(Method::PUT, &["connectors", name, "config"], Some(config))
            .await
    }

    async fn control(&self, name: &str, verb: ControlVerb) -> Result<StatusCode, ApiError> {
        let mut segments = vec!["connectors", name];
        if !verb.sub_path().is_empty() {
            segments.push(verb.sub_path());
        }
        self.send_for_status(verb.method(), &segments, None).await
    }

    async fn control_task(
        &self,
        name: &str,
        task_id: i32,
        verb: ControlVerb,
    ) -> Result<StatusCode, ApiError> {
        let task_id = task_id.to_string();
        let mut segments = vec!["connectors", name, "tasks", task_id.as_str()];
        if !verb.sub_path().is_empty() {
            segments.push(verb.sub_path());
        }
        self.send_for_status(verb.method(), &segments, None).await
    }
}

async fn ensure_success(res: Response) -> Result<Response, ApiError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text().await.unwrap_or_default();
    Err(ApiError::Status { status, body })
}

async fn decode_json<T>(url: &str, res: Response) -> Result<T, ApiError>
where
    T: DeserializeOwned,
{
    let bytes = res.bytes().await.map_err(|source| ApiError::Transport {
        url: url.to_string(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|err| ApiError::Decode {
        url: url.to_string(),
        message: err.to_string(),
    })
}

fn error_body(value: &Value) -> Option<ErrorBody> {
    value.get("error_code")?;
    serde_json::from_value(value.clone()).ok()
}

fn config_map_from_value(value: &Value) -> Option<ConfigMap> {
    let object = value.as_object()?;
    Some(
        object
            .iter()
            .filter_map(|(key, value)| coerce_scalar(value).map(|v| (key.clone(), v)))
            .collect(),
    )
}

pub(crate) fn render_coordinator_error(status: StatusCode, body: &str) -> String {
    if let Some(err) = extract_error_message(body) {
        return format!("coordinator error (status {}): {}", status, err);
    }
    format!("coordinator request failed with status {}", status)
}

pub(crate) fn extract_error_message(body: &str) -> Option<String> {
    if let Ok(val) = serde_json::from_str::<Value>(body)
        && let Some(err) = val.get("message").and_then(|e| e.as_str())
    {
        return Some(err.to_string());
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
