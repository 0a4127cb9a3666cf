//! Common test utilities and helpers
//!
//! A primitive HTTP server standing in for HipChat, plus a command builder
//! for driving the `hipchat-notify` binary.

#![allow(dead_code)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// A request received by the mock server
#[derive(Clone, Debug)]
pub struct Request {
    pub method: String,
    /// Path including the query string, as sent on the request line
    pub target: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl Request {
    pub fn path(&self) -> &str {
        self.target.split('?').next().unwrap_or_default()
    }

    pub fn query(&self) -> Option<&str> {
        self.target.split_once('?').map(|(_, query)| query)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn body_str(&self) -> String {
        String::from_utf8(self.body.clone()).unwrap()
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

/// The response the mock server sends back
#[derive(Clone, Debug)]
pub struct Response {
    pub code: u16,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(code: u16) -> Self {
        Self {
            code,
            body: Vec::new(),
        }
    }

    pub fn body(mut self, body: &str) -> Self {
        self.body = body.as_bytes().to_vec();
        self
    }

    /// What the v1 API answers for a delivered message
    pub fn v1_sent() -> Self {
        Self::new(200).body(r#"{"status":"sent"}"#)
    }

    /// What the v2 API answers for a delivered notification
    pub fn v2_sent() -> Self {
        Self::new(204)
    }
}

pub type Responder = Box<dyn Send + Fn(&Request) -> Response>;

/// Handle to a running mock server; stops the server when dropped
pub struct MockServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<Request>>>,
}

impl MockServer {
    /// Start a server answering every request with `responder`
    pub fn start<R: 'static + Send + Fn(&Request) -> Response>(responder: R) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);
        let responder: Responder = Box::new(responder);
        std::thread::spawn(move || serve(listener, recorded, responder));
        Self { addr, requests }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        if let Ok(mut stream) = TcpStream::connect(self.addr) {
            // shut down the server
            let _ = stream.write_all(b"STOP\r\n");
            let _ = stream.flush();
        }
    }
}

fn serve(listener: TcpListener, requests: Arc<Mutex<Vec<Request>>>, responder: Responder) {
    let mut line = String::new();
    'server: loop {
        let Ok((socket, _)) = listener.accept() else {
            return;
        };
        let mut buf = BufReader::new(socket);
        line.clear();
        if buf.read_line(&mut line).unwrap_or(0) == 0 {
            continue;
        }
        let mut parts = line.split_ascii_whitespace();
        let method = parts.next().unwrap_or_default().to_ascii_uppercase();
        if method == "STOP" {
            return;
        }
        let target = parts.next().unwrap_or_default().to_string();

        let mut headers = HashMap::new();
        let mut content_len = 0usize;
        loop {
            line.clear();
            if buf.read_line(&mut line).unwrap_or(0) == 0 {
                continue 'server;
            }
            if line == "\r\n" {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                let name = name.trim().to_ascii_lowercase();
                let value = value.trim().to_string();
                if name == "content-length" {
                    content_len = value.parse().unwrap_or(0);
                }
                headers.insert(name, value);
            }
        }
        let mut body = vec![0u8; content_len];
        if buf.read_exact(&mut body).is_err() {
            continue;
        }

        let request = Request {
            method,
            target,
            headers,
            body,
        };
        let response = responder(&request);
        requests.lock().unwrap().push(request);

        let stream = buf.get_mut();
        let _ = write!(stream, "HTTP/1.1 {}\r\n", response.code);
        let _ = write!(stream, "Content-Length: {}\r\n", response.body.len());
        let _ = write!(stream, "Connection: close\r\n\r\n");
        let _ = stream.write_all(&response.body);
        let _ = stream.flush();
    }
}

/// Test command builder for the hipchat-notify CLI
pub struct TestCommand {
    cmd: Command,
}

impl TestCommand {
    pub fn new() -> Self {
        let mut cmd = Command::cargo_bin("hipchat-notify").expect("Failed to find hipchat-notify binary");
        cmd.env_remove("HIPCHAT_TOKEN").env_remove("RUST_LOG");
        Self { cmd }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for arg in args {
            self.cmd.arg(arg.as_ref());
        }
        self
    }

    pub fn arg<S: AsRef<str>>(mut self, arg: S) -> Self {
        self.cmd.arg(arg.as_ref());
        self
    }

    pub fn env<K, V>(mut self, key: K, val: V) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.cmd.env(key.as_ref(), val.as_ref());
        self
    }

    /// Execute and expect success
    pub fn expect_success(mut self) -> TestAssertion {
        let assert = self.cmd.assert().success();
        TestAssertion { assert }
    }

    /// Execute and expect failure
    pub fn expect_failure(mut self) -> TestAssertion {
        let assert = self.cmd.assert().failure();
        TestAssertion { assert }
    }
}

impl Default for TestCommand {
    fn default() -> Self {
        Self::new()
    }
}

/// Test assertion wrapper with convenient methods
pub struct TestAssertion {
    assert: assert_cmd::assert::Assert,
}

impl TestAssertion {
    pub fn stdout_contains<S: AsRef<str>>(self, text: S) -> Self {
        let assert = self.assert.stdout(predicate::str::contains(text.as_ref()));
        Self { assert }
    }

    pub fn stdout_lacks<S: AsRef<str>>(self, text: S) -> Self {
        let assert = self
            .assert
            .stdout(predicate::str::contains(text.as_ref()).not());
        Self { assert }
    }

    pub fn stderr_contains<S: AsRef<str>>(self, text: S) -> Self {
        let assert = self.assert.stderr(predicate::str::contains(text.as_ref()));
        Self { assert }
    }

    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.assert.get_output().stdout).into_owned()
    }

    pub fn done(self) -> assert_cmd::assert::Assert {
        self.assert
    }
}

/// A project directory holding `.hipchat/config.toml`
pub struct TestEnvironment {
    pub temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        Self { temp_dir }
    }

    /// Environment with `config` written as the project configuration
    pub fn with_config(config: &str) -> Self {
        let env = Self::new();
        let path = env.config_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, config).unwrap();
        env
    }

    pub fn project_path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.temp_dir.path().join(".hipchat").join("config.toml")
    }

    /// Write `content` next to the configuration and return its path
    pub fn write_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    /// Create a command configured for this environment
    pub fn command(&self) -> TestCommand {
        TestCommand::new()
            .env("HOME", self.project_path().to_string_lossy())
            .arg("--project")
            .arg(self.project_path().to_string_lossy())
    }
}

impl Default for TestEnvironment {
    fn default() -> Self {
        Self::new()
    }
}
