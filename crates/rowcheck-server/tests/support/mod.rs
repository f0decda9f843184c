// SPDX-License-Identifier: Apache-2.0

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;

use rowcheck_server::{build_router, AppState, ServerConfig};
use serde_json::Value;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

pub struct TestServer {
    pub addr: SocketAddr,
    pub root: TempDir,
}

impl TestServer {
    pub fn upload_dir(&self) -> std::path::PathBuf {
        self.root.path().join("uploads")
    }

    pub fn report_dir(&self) -> std::path::PathBuf {
        self.root.path().join("reports")
    }
}

pub async fn spawn_server() -> TestServer {
    spawn_server_with(|cfg| cfg).await
}

pub async fn spawn_server_with(tune: impl FnOnce(ServerConfig) -> ServerConfig) -> TestServer {
    let root = tempfile::tempdir().expect("tempdir");
    let cfg = tune(config_for(root.path()));
    let state = AppState::prepare(cfg).expect("prepare storage");
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve app");
    });
    TestServer { addr, root }
}

pub fn config_for(root: &Path) -> ServerConfig {
    ServerConfig {
        upload_dir: root.join("uploads"),
        report_dir: root.join("reports"),
        log_json: false,
        ..ServerConfig::default()
    }
}

#[derive(Debug)]
pub struct RawResponse {
    pub status: u16,
    pub head: String,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn header(&self, name: &str) -> Option<String> {
        let prefix = format!("{}:", name.to_ascii_lowercase());
        self.head.lines().find_map(|line| {
            line.to_ascii_lowercase()
                .starts_with(&prefix)
                .then(|| line[prefix.len()..].trim().to_string())
        })
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("json body")
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.clone()).expect("utf8 body")
    }

    pub fn error_code(&self) -> String {
        self.json()["error"]["code"]
            .as_str()
            .expect("error code")
            .to_string()
    }
}

pub async fn send(
    addr: SocketAddr,
    method: &str,
    path: &str,
    headers: &[(&str, &str)],
    body: &[u8],
) -> RawResponse {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    let mut request = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n");
    for (name, value) in headers {
        request.push_str(&format!("{name}: {value}\r\n"));
    }
    request.push_str(&format!("Content-Length: {}\r\n\r\n", body.len()));
    let mut bytes = request.into_bytes();
    bytes.extend_from_slice(body);
    stream.write_all(&bytes).await.expect("write request");

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.expect("read response");
    parse_response(&raw)
}

fn parse_response(raw: &[u8]) -> RawResponse {
    let split = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("response head terminator");
    let head = String::from_utf8_lossy(&raw[..split]).to_string();
    let status = head
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse::<u16>().ok())
        .expect("status code");
    RawResponse {
        status,
        head,
        body: raw[split + 4..].to_vec(),
    }
}

pub const BOUNDARY: &str = "rowcheck-test-boundary";

pub fn multipart_body(field: &str, filename: Option<&str>, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    match filename {
        Some(name) => body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{field}\"; filename=\"{name}\"\r\nContent-Type: text/csv\r\n\r\n"
            )
            .as_bytes(),
        ),
        None => body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{field}\"\r\n\r\n").as_bytes(),
        ),
    }
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn upload(addr: SocketAddr, filename: &str, content: &[u8]) -> RawResponse {
    let content_type = format!("multipart/form-data; boundary={BOUNDARY}");
    send(
        addr,
        "POST",
        "/upload",
        &[("Content-Type", content_type.as_str())],
        &multipart_body("file", Some(filename), content),
    )
    .await
}

pub async fn validate(addr: SocketAddr, filename: &str) -> RawResponse {
    let path = format!("/validate?filename={}", percent_encode(filename));
    send(addr, "POST", &path, &[], b"").await
}

pub async fn download(addr: SocketAddr) -> RawResponse {
    send(addr, "GET", "/download", &[], b"").await
}

pub fn percent_encode(raw: &str) -> String {
    raw.bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{b:02X}"),
        })
        .collect()
}
