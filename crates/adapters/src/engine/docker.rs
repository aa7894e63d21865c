// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Docker Engine API client, speaking raw HTTP/1.1 over the daemon's Unix
//! socket (or a TCP `DOCKER_HOST`): hand-built request strings,
//! `Content-Length`-framed response reads, no HTTP client crate.

use super::{ContainerEngine, EngineError, Inspection};
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use stv_core::{ContainerConfig, RestartPolicy};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
#[cfg(unix)]
use tokio::net::UnixStream;
use tokio::sync::Semaphore;
use std::sync::Arc;

const DEFAULT_SOCKET: &str = "/var/run/docker.sock";
const DEFAULT_API_VERSION: &str = "1.43";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Where to dial the Docker daemon, resolved once at construction from
/// `DOCKER_HOST` — read directly here, not re-exposed by the daemon
/// crate's own environment module.
#[derive(Debug, Clone)]
enum Endpoint {
    Unix(String),
    Tcp(String),
}

impl Endpoint {
    fn from_env() -> Self {
        match std::env::var("DOCKER_HOST") {
            Ok(host) if host.starts_with("unix://") => {
                Endpoint::Unix(host.trim_start_matches("unix://").to_string())
            }
            Ok(host) if host.starts_with("tcp://") => {
                Endpoint::Tcp(host.trim_start_matches("tcp://").to_string())
            }
            Ok(host) => Endpoint::Tcp(host),
            Err(_) => Endpoint::Unix(DEFAULT_SOCKET.to_string()),
        }
    }
}

/// Client for the Docker Engine API. Bounds concurrent connections with a
/// semaphore rather than pooling live handles — each call dials, sends,
/// reads, and closes, which is cheap enough over a local socket.
pub struct DockerEngine {
    endpoint: Endpoint,
    api_version: String,
    handles: Arc<Semaphore>,
}

impl DockerEngine {
    pub fn new(max_concurrent: usize) -> Self {
        let api_version =
            std::env::var("DOCKER_API_VERSION").unwrap_or_else(|_| DEFAULT_API_VERSION.to_string());
        Self { endpoint: Endpoint::from_env(), api_version, handles: Arc::new(Semaphore::new(max_concurrent)) }
    }

    fn path(&self, suffix: &str) -> String {
        format!("/v{}{}", self.api_version, suffix)
    }

    async fn request(&self, method: &str, path: &str, body: Option<&str>) -> Result<(u16, String), EngineError> {
        let _permit = self.handles.acquire().await.map_err(|_| EngineError::Connect("semaphore closed".into()))?;
        tokio::time::timeout(REQUEST_TIMEOUT, self.send(method, path, body))
            .await
            .map_err(|_| EngineError::Timeout)?
    }

    async fn send(&self, method: &str, path: &str, body: Option<&str>) -> Result<(u16, String), EngineError> {
        let request = match body {
            Some(b) => format!(
                "{method} {path} HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
                b.len(),
                b
            ),
            None => format!("{method} {path} HTTP/1.1\r\nHost: localhost\r\n\r\n"),
        };

        match &self.endpoint {
            #[cfg(unix)]
            Endpoint::Unix(socket_path) => {
                let mut stream = UnixStream::connect(socket_path)
                    .await
                    .map_err(|e| EngineError::Connect(format!("{socket_path}: {e}")))?;
                stream.write_all(request.as_bytes()).await.map_err(|e| EngineError::Connect(e.to_string()))?;
                let mut reader = BufReader::new(&mut stream);
                read_response(&mut reader).await
            }
            #[cfg(not(unix))]
            Endpoint::Unix(_) => Err(EngineError::Connect("unix sockets unsupported on this platform".into())),
            Endpoint::Tcp(addr) => {
                let mut stream =
                    TcpStream::connect(addr).await.map_err(|e| EngineError::Connect(format!("{addr}: {e}")))?;
                stream.write_all(request.as_bytes()).await.map_err(|e| EngineError::Connect(e.to_string()))?;
                let mut reader = BufReader::new(&mut stream);
                read_response(&mut reader).await
            }
        }
    }
}

/// Read an HTTP/1.1 status line, headers, and a `Content-Length`-framed
/// body. Returns the status code alongside the body so callers can
/// distinguish e.g. a 404 on inspect from a 500.
async fn read_response<R: tokio::io::AsyncRead + Unpin>(
    reader: &mut BufReader<R>,
) -> Result<(u16, String), EngineError> {
    let mut status_line = String::new();
    reader.read_line(&mut status_line).await.map_err(|e| EngineError::Connect(e.to_string()))?;
    let status_code =
        status_line.split_whitespace().nth(1).and_then(|s| s.parse::<u16>().ok()).unwrap_or(0);

    let mut content_length: usize = 0;
    let mut chunked = false;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).await.map_err(|e| EngineError::Connect(e.to_string()))?;
        if line == "\r\n" || line.is_empty() {
            break;
        }
        let lower = line.to_ascii_lowercase();
        if let Some(val) = lower.strip_prefix("content-length:") {
            content_length = val.trim().parse().unwrap_or(0);
        }
        if lower.starts_with("transfer-encoding:") && lower.contains("chunked") {
            chunked = true;
        }
    }

    let body = if chunked {
        read_chunked_body(reader).await?
    } else if content_length > 0 {
        let mut buf = vec![0u8; content_length];
        reader.read_exact(&mut buf).await.map_err(|e| EngineError::Connect(e.to_string()))?;
        String::from_utf8_lossy(&buf).into_owned()
    } else {
        String::new()
    };

    Ok((status_code, body))
}

/// Docker's image-pull endpoint streams newline-delimited JSON over
/// chunked transfer encoding; drain it fully so the connection's next
/// request isn't left reading a half-consumed body.
async fn read_chunked_body<R: tokio::io::AsyncRead + Unpin>(
    reader: &mut BufReader<R>,
) -> Result<String, EngineError> {
    let mut out = String::new();
    loop {
        let mut size_line = String::new();
        reader.read_line(&mut size_line).await.map_err(|e| EngineError::Connect(e.to_string()))?;
        let size = usize::from_str_radix(size_line.trim(), 16)
            .map_err(|e| EngineError::Decode(format!("bad chunk size: {e}")))?;
        if size == 0 {
            let mut trailer = String::new();
            reader.read_line(&mut trailer).await.ok();
            break;
        }
        let mut buf = vec![0u8; size];
        reader.read_exact(&mut buf).await.map_err(|e| EngineError::Connect(e.to_string()))?;
        out.push_str(&String::from_utf8_lossy(&buf));
        let mut crlf = [0u8; 2];
        reader.read_exact(&mut crlf).await.map_err(|e| EngineError::Connect(e.to_string()))?;
    }
    Ok(out)
}

fn restart_policy_name(policy: RestartPolicy) -> &'static str {
    match policy {
        RestartPolicy::No => "no",
        RestartPolicy::Always => "always",
        RestartPolicy::UnlessStopped => "unless-stopped",
        RestartPolicy::OnFailure => "on-failure",
    }
}

#[async_trait]
impl ContainerEngine for DockerEngine {
    async fn run(&self, config: &ContainerConfig) -> Result<String, EngineError> {
        let image_escaped = urlencode(&config.image);
        let (status, body) =
            self.request("POST", &self.path(&format!("/images/create?fromImage={image_escaped}")), None).await?;
        if status >= 400 {
            return Err(EngineError::Remote(format!("image pull failed ({status}): {}", body.trim())));
        }

        let exposed_ports: serde_json::Map<String, serde_json::Value> = config
            .exposed_ports
            .iter()
            .map(|p| (format!("{}/{}", p.port, p.protocol), json!({})))
            .collect();
        let port_bindings: serde_json::Map<String, serde_json::Value> = config
            .exposed_ports
            .iter()
            .map(|p| (format!("{}/{}", p.port, p.protocol), json!([{"HostPort": ""}])))
            .collect();
        let env: Vec<String> = config.env.iter().map(|(k, v)| format!("{k}={v}")).collect();

        let create_body = json!({
            "Image": config.image,
            "Env": env,
            "ExposedPorts": exposed_ports,
            "HostConfig": {
                "PortBindings": port_bindings,
                "PublishAllPorts": true,
                "RestartPolicy": { "Name": restart_policy_name(config.restart_policy) },
                "Memory": config.memory_bytes,
                "NanoCpus": (config.cpu * 1_000_000_000.0) as i64,
            },
        })
        .to_string();

        let (status, body) = self
            .request("POST", &self.path(&format!("/containers/create?name={}", urlencode(&config.name))), Some(&create_body))
            .await?;
        if status >= 400 {
            return Err(EngineError::Remote(format!("container create failed ({status}): {}", body.trim())));
        }
        let created: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| EngineError::Decode(e.to_string()))?;
        let container_id = created
            .get("Id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| EngineError::Decode("create response missing Id".into()))?
            .to_string();

        let (status, body) = self.request("POST", &self.path(&format!("/containers/{container_id}/start")), None).await?;
        if status >= 400 {
            return Err(EngineError::Remote(format!("container start failed ({status}): {}", body.trim())));
        }

        Ok(container_id)
    }

    async fn stop(&self, container_id: &str) -> Result<(), EngineError> {
        let (status, body) = self.request("POST", &self.path(&format!("/containers/{container_id}/stop")), None).await?;
        if status >= 400 && status != 304 {
            return Err(EngineError::Remote(format!("container stop failed ({status}): {}", body.trim())));
        }

        let (status, body) = self.request("DELETE", &self.path(&format!("/containers/{container_id}?v=true&force=false")), None).await?;
        if status >= 400 {
            return Err(EngineError::Remote(format!("container remove failed ({status}): {}", body.trim())));
        }
        Ok(())
    }

    async fn inspect(&self, container_id: &str) -> Result<Inspection, EngineError> {
        let (status, body) = self.request("GET", &self.path(&format!("/containers/{container_id}/json")), None).await?;
        if status >= 400 {
            return Err(EngineError::Remote(format!("container inspect failed ({status}): {}", body.trim())));
        }
        let parsed: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| EngineError::Decode(e.to_string()))?;
        let status_str = parsed
            .pointer("/State/Status")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string();

        let mut network_ports = HashMap::new();
        if let Some(ports) = parsed.pointer("/NetworkSettings/Ports").and_then(|v| v.as_object()) {
            for (container_port, bindings) in ports {
                if let Some(first) = bindings.as_array().and_then(|a| a.first()) {
                    if let Some(host_port) = first.get("HostPort").and_then(|v| v.as_str()) {
                        network_ports.insert(container_port.clone(), host_port.to_string());
                    }
                }
            }
        }

        Ok(Inspection { status: status_str, network_ports })
    }
}

/// Percent-encode the handful of characters that appear in image
/// references and container names (`:`, `/`); not a general URL encoder.
fn urlencode(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            ':' => "%3A".to_string(),
            '/' => "%2F".to_string(),
            c => c.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urlencode_escapes_colon_and_slash() {
        assert_eq!(urlencode("nginx:latest"), "nginx%3Alatest");
        assert_eq!(urlencode("library/nginx"), "library%2Fnginx");
    }

    #[test]
    fn endpoint_defaults_to_the_standard_unix_socket() {
        std::env::remove_var("DOCKER_HOST");
        match Endpoint::from_env() {
            Endpoint::Unix(path) => assert_eq!(path, DEFAULT_SOCKET),
            Endpoint::Tcp(_) => panic!("expected unix default"),
        }
    }

    #[test]
    fn endpoint_parses_tcp_docker_host() {
        std::env::set_var("DOCKER_HOST", "tcp://10.0.0.5:2375");
        match Endpoint::from_env() {
            Endpoint::Tcp(addr) => assert_eq!(addr, "10.0.0.5:2375"),
            Endpoint::Unix(_) => panic!("expected tcp"),
        }
        std::env::remove_var("DOCKER_HOST");
    }
}
