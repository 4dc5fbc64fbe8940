use std::collections::{BTreeMap, HashMap, VecDeque};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Mutex, mpsc};
use std::thread;

use async_trait::async_trait;
use common::api::{
    ConfigValidation, ConfigValueInfo, ConnectorState, ConnectorStateInfo,
    ConnectorStatusResponse, ErrorBody, TaskStatusInfo, ValidationResponse,
};
use reqwest::StatusCode;

use crate::api::{ApiError, ConfigMap, ControlVerb, DeployedConfig, FleetClient};
use crate::fleet::{Connector, Task};
use crate::prompt::Prompt;

pub(crate) static ENV_LOCK: Mutex<()> = Mutex::new(());

pub(crate) fn config(pairs: &[(&str, &str)]) -> ConfigMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub(crate) fn status_error(status: u16, message: &str) -> ApiError {
    ApiError::Status {
        status: StatusCode::from_u16(status).expect("status code"),
        body: format!(r#"{{"error_code":{status},"message":"{message}"}}"#),
    }
}

pub(crate) fn invalid_response(name: &str, errors: &[(&str, &str)]) -> ValidationResponse {
    ValidationResponse {
        name: name.to_string(),
        error_count: errors.len() as u32,
        configs: errors
            .iter()
            .map(|(field, message)| ConfigValidation {
                value: ConfigValueInfo {
                    name: field.to_string(),
                    errors: vec![message.to_string()],
                },
            })
            .collect(),
    }
}

pub(crate) fn connector(id: usize, name: &str, state: ConnectorState) -> Connector {
    Connector {
        id,
        name: name.to_string(),
        state,
        worker_id: "worker-1:8083".to_string(),
        config: ConfigMap::new(),
        tasks: Vec::new(),
    }
}

pub(crate) fn task(id: i32, state: ConnectorState) -> Task {
    Task {
        id,
        state,
        worker_id: "worker-1:8083".to_string(),
        trace: None,
        config: ConfigMap::new(),
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct FakeConnector {
    pub state: ConnectorState,
    pub worker_id: String,
    pub config: ConfigMap,
    pub tasks: Vec<TaskStatusInfo>,
    pub task_configs: BTreeMap<i32, ConfigMap>,
}

#[derive(Default)]
struct FakeState {
    connectors: BTreeMap<String, FakeConnector>,
    validations: HashMap<String, ValidationResponse>,
    failures: HashMap<String, VecDeque<ApiError>>,
    calls: Vec<String>,
}

/// In-memory coordinator. Every call is recorded as a short label such as
/// `pause jdbc` or `restart jdbc/1`; the same labels key scripted failures.
#[derive(Default)]
pub(crate) struct FakeFleet {
    inner: Mutex<FakeState>,
}

impl FakeFleet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_connector(self, name: &str, state: ConnectorState) -> Self {
        self.inner.lock().expect("lock").connectors.insert(
            name.to_string(),
            FakeConnector {
                state,
                worker_id: "worker-1:8083".to_string(),
                ..FakeConnector::default()
            },
        );
        self
    }

    pub fn with_config(self, name: &str, pairs: &[(&str, &str)]) -> Self {
        if let Some(connector) = self.inner.lock().expect("lock").connectors.get_mut(name) {
            connector.config = config(pairs);
        }
        self
    }

    pub fn with_task(self, name: &str, id: i32, state: ConnectorState) -> Self {
        if let Some(connector) = self.inner.lock().expect("lock").connectors.get_mut(name) {
            connector.tasks.push(TaskStatusInfo {
                id,
                state,
                worker_id: "worker-1:8083".to_string(),
                trace: None,
            });
            connector.task_configs.insert(id, ConfigMap::new());
        }
        self
    }

    pub fn with_validation(self, plugin: &str, response: ValidationResponse) -> Self {
        self.inner
            .lock()
            .expect("lock")
            .validations
            .insert(plugin.to_string(), response);
        self
    }

    /// Queues an error for the next call with this label.
    pub fn fail_next(self, label: &str, error: ApiError) -> Self {
        self.inner
            .lock()
            .expect("lock")
            .failures
            .entry(label.to_string())
            .or_default()
            .push_back(error);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().expect("lock").calls.clone()
    }

    /// Calls that change coordinator state.
    pub fn mutations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| {
                ["pause ", "resume ", "restart ", "delete ", "put-config "]
                    .iter()
                    .any(|prefix| call.starts_with(prefix))
            })
            .collect()
    }

    pub fn state_of(&self, name: &str) -> Option<ConnectorState> {
        self.inner
            .lock()
            .expect("lock")
            .connectors
            .get(name)
            .map(|c| c.state.clone())
    }

    pub fn config_of(&self, name: &str) -> Option<ConfigMap> {
        self.inner
            .lock()
            .expect("lock")
            .connectors
            .get(name)
            .map(|c| c.config.clone())
    }

    fn record(&self, label: String) -> Result<(), ApiError> {
        let mut inner = self.inner.lock().expect("lock");
        inner.calls.push(label.clone());
        match inner.failures.get_mut(&label).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn not_found(name: &str) -> ApiError {
    status_error(404, &format!("Connector {name} not found"))
}

#[async_trait]
impl FleetClient for FakeFleet {
    async fn list_connector_names(&self) -> Result<Vec<String>, ApiError> {
        self.record("list".to_string())?;
        Ok(self
            .inner
            .lock()
            .expect("lock")
            .connectors
            .keys()
            .rev()
            .cloned()
            .collect())
    }

    async fn connector_status(&self, name: &str) -> Result<ConnectorStatusResponse, ApiError> {
        self.record(format!("status {name}"))?;
        let inner = self.inner.lock().expect("lock");
        let connector = inner.connectors.get(name).ok_or_else(|| not_found(name))?;
        Ok(ConnectorStatusResponse {
            name: name.to_string(),
            connector: ConnectorStateInfo {
                state: connector.state.clone(),
                worker_id: connector.worker_id.clone(),
            },
            tasks: connector.tasks.clone(),
        })
    }

    async fn connector_config(&self, name: &str) -> Result<DeployedConfig, ApiError> {
        self.record(format!("config {name}"))?;
        let inner = self.inner.lock().expect("lock");
        Ok(match inner.connectors.get(name) {
            Some(connector) => DeployedConfig::Found(connector.config.clone()),
            None => DeployedConfig::Error(ErrorBody {
                error_code: 404,
                message: format!("Connector {name} not found"),
            }),
        })
    }

    async fn connector_tasks(&self, name: &str) -> Result<BTreeMap<i32, ConfigMap>, ApiError> {
        self.record(format!("tasks {name}"))?;
        let inner = self.inner.lock().expect("lock");
        let connector = inner.connectors.get(name).ok_or_else(|| not_found(name))?;
        Ok(connector.task_configs.clone())
    }

    async fn validate_plugin_config(
        &self,
        plugin_class: &str,
        config: &ConfigMap,
    ) -> Result<ValidationResponse, ApiError> {
        self.record(format!("validate {plugin_class}"))?;
        let inner = self.inner.lock().expect("lock");
        Ok(inner
            .validations
            .get(plugin_class)
            .cloned()
            .unwrap_or_else(|| ValidationResponse {
                name: config.get("connector.class").cloned().unwrap_or_default(),
                error_count: 0,
                configs: Vec::new(),
            }))
    }

    async fn put_config(&self, name: &str, config: &ConfigMap) -> Result<StatusCode, ApiError> {
        self.record(format!("put-config {name}"))?;
        let mut inner = self.inner.lock().expect("lock");
        let created = !inner.connectors.contains_key(name);
        let entry = inner
            .connectors
            .entry(name.to_string())
            .or_insert_with(|| FakeConnector {
                state: ConnectorState::Running,
                ..FakeConnector::default()
            });
        entry.config = config.clone();
        Ok(if created {
            StatusCode::CREATED
        } else {
            StatusCode::OK
        })
    }

    async fn control(&self, name: &str, verb: ControlVerb) -> Result<StatusCode, ApiError> {
        let label = match verb {
            ControlVerb::Pause => "pause",
            ControlVerb::Resume => "resume",
            ControlVerb::Restart => "restart",
            ControlVerb::Delete => "delete",
        };
        self.record(format!("{label} {name}"))?;
        let mut inner = self.inner.lock().expect("lock");
        if !inner.connectors.contains_key(name) {
            return Err(not_found(name));
        }
        match verb {
            ControlVerb::Pause => {
                if let Some(c) = inner.connectors.get_mut(name) {
                    c.state = ConnectorState::Paused;
                }
                Ok(StatusCode::ACCEPTED)
            }
            ControlVerb::Resume => {
                if let Some(c) = inner.connectors.get_mut(name) {
                    c.state = ConnectorState::Running;
                }
                Ok(StatusCode::ACCEPTED)
            }
            ControlVerb::Restart => Ok(StatusCode::NO_CONTENT),
            ControlVerb::Delete => {
                inner.connectors.remove(name);
                Ok(StatusCode::NO_CONTENT)
            }
        }
    }

    async fn control_task(
        &self,
        name: &str,
        task_id: i32,
        verb: ControlVerb,
    ) -> Result<StatusCode, ApiError> {
        self.record(format!("restart {name}/{task_id}"))?;
        let inner = self.inner.lock().expect("lock");
        let connector = inner.connectors.get(name).ok_or_else(|| not_found(name))?;
        if verb != ControlVerb::Restart || !connector.task_configs.contains_key(&task_id) {
            return Err(not_found(name));
        }
        Ok(StatusCode::NO_CONTENT)
    }
}

/// Replays canned answers and remembers the questions asked.
#[derive(Default)]
pub(crate) struct ScriptedPrompt {
    answers: VecDeque<String>,
    pub asked: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|a| a.to_string()).collect(),
            asked: Vec::new(),
        }
    }
}

impl Prompt for ScriptedPrompt {
    fn ask(&mut self, message: &str) -> anyhow::Result<String> {
        self.asked.push(message.to_string());
        Ok(self.answers.pop_front().unwrap_or_default())
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Route {
    pub key: String,
    pub status: u16,
    pub body: String,
}

impl Route {
    pub fn new(key: &str, status: u16, body: &str) -> Self {
        Self {
            key: key.to_string(),
            status,
            body: body.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub request_line: String,
    pub body: String,
}

/// Serves canned responses keyed by `METHOD /path` until the test exits.
pub(crate) fn spawn_coordinator(
    routes: Vec<Route>,
) -> (SocketAddr, mpsc::Receiver<RecordedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            let Some(request) = read_request(&mut stream) else {
                continue;
            };
            let response = match routes.iter().find(|r| r.key == request.request_line) {
                Some(route) => http_response(route.status, &route.body),
                None => http_response(404, r#"{"error_code":404,"message":"no route"}"#),
            };
            let _ = stream.write_all(response.as_bytes());
            let _ = tx.send(request);
        }
    });
    (addr, rx)
}

fn read_request(stream: &mut TcpStream) -> Option<RecordedRequest> {
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    reader.read_line(&mut line).ok()?;
    let mut parts = line.split_whitespace();
    let method = parts.next()?.to_string();
    let target = parts.next()?;
    let path = target.split('?').next().unwrap_or(target);

    let mut content_length = 0usize;
    loop {
        let mut header = String::new();
        if reader.read_line(&mut header).ok()? == 0 {
            break;
        }
        let header = header.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':')
            && name.eq_ignore_ascii_case("content-length")
        {
            content_length = value.trim().parse().unwrap_or(0);
        }
    }

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).ok()?;
    Some(RecordedRequest {
        request_line: format!("{method} {path}"),
        body: String::from_utf8_lossy(&body).to_string(),
    })
}

fn http_response(status: u16, body: &str) -> String {
    format!(
        "HTTP/1.1 {status} X\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    )
}
