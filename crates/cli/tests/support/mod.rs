#![allow(dead_code)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;

/// Canned response for one `METHOD /path`.
#[derive(Debug, Clone)]
pub struct Route {
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

/// Fake coordinator on an ephemeral port. Serves until the test process exits
/// and records every request line (`METHOD /path`) with its body.
pub struct Coordinator {
    pub addr: SocketAddr,
    seen: Arc<Mutex<Vec<(String, String)>>>,
}

impl Coordinator {
    pub fn start(routes: Vec<Route>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind test listener");
        let addr = listener.local_addr().expect("listener addr");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { continue };
                let Some((line, body)) = read_request(&mut stream) else {
                    continue;
                };
                let response = match routes.iter().find(|r| r.key == line) {
                    Some(route) => http_response(route.status, &route.body),
                    None => http_response(
                        404,
                        r#"{"error_code":404,"message":"Connector not found"}"#,
                    ),
                };
                seen_clone.lock().expect("lock requests").push((line, body));
                let _ = stream.write_all(response.as_bytes());
            }
        });

        Self { addr, seen }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<String> {
        self.seen
            .lock()
            .expect("lock requests")
            .iter()
            .map(|(line, _)| line.clone())
            .collect()
    }

    /// Requests that change coordinator state.
    pub fn mutations(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter(|line| !line.starts_with("GET ") && !line.contains("/validate"))
            .collect()
    }

    pub fn body_of(&self, request_line: &str) -> Option<String> {
        self.seen
            .lock()
            .expect("lock requests")
            .iter()
            .find(|(line, _)| line == request_line)
            .map(|(_, body)| body.clone())
    }
}

fn read_request(stream: &mut TcpStream) -> Option<(String, String)> {
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    reader.read_line(&mut line).ok()?;
    let mut parts = line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

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
    Some((
        format!("{method} {path}"),
        String::from_utf8_lossy(&body).to_string(),
    ))
}

fn http_response(status: u16, body: &str) -> String {
    format!(
        "HTTP/1.1 {status} X\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    )
}

/// Routes describing one task-less connector.
pub fn connector_routes(name: &str, state: &str, config: &str) -> Vec<Route> {
    vec![
        Route::new(
            &format!("GET /connectors/{name}/status"),
            200,
            &format!(
                r#"{{"name":"{name}","connector":{{"state":"{state}","worker_id":"10.0.0.1:8083"}},"tasks":[]}}"#
            ),
        ),
        Route::new(&format!("GET /connectors/{name}/config"), 200, config),
        Route::new(&format!("GET /connectors/{name}/tasks"), 200, "[]"),
    ]
}

/// `connctl` isolated from the caller's environment and profiles.
pub fn connctl(coordinator: &Coordinator, config_home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("connctl"));
    cmd.env("CONNCTL_URL", coordinator.url())
        .env("CONNCTL_RETRY_BACKOFF_MS", "1")
        .env("XDG_CONFIG_HOME", config_home)
        .env("NO_COLOR", "1")
        .env_remove("CONNCTL_RETRIES")
        .env_remove("CONNCTL_TIMEOUT_SECS")
        .env_remove("CONNCTL_CONCURRENCY")
        .env_remove("RUST_LOG");
    cmd
}

/// Runs `cmd` with `stdin` piped in.
pub fn run_with_stdin(cmd: &mut Command, stdin: &str) -> Output {
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn cli");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(stdin.as_bytes())
        .expect("write stdin");
    child.wait_with_output().expect("wait for cli")
}

pub fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}
