// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP/1.1 client for Manager→Worker traffic.
//!
//! Hand-built request strings over a `TcpStream`, `Content-Length`-framed
//! response reads, one connection per call. No `reqwest`/`hyper` — the
//! wire protocol here is a closed contract between two processes this
//! codebase owns on both ends.

use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

/// Read/write timeout, covering connect + write + read as one budget.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("request timed out")]
    Timeout,
    #[error("io error: {0}")]
    Io(String),
}

/// A raw (status, body) pair. Callers decode `body` themselves — this
/// crate doesn't know about `StandardResponse`'s payload type.
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

pub async fn get(addr: &str, path: &str) -> Result<RawResponse, TransportError> {
    let request = format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\n\r\n");
    send(addr, &request).await
}

pub async fn post(addr: &str, path: &str, json_body: &str) -> Result<RawResponse, TransportError> {
    let request = format!(
        "POST {path} HTTP/1.1\r\nHost: {addr}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
        json_body.len(),
        json_body
    );
    send(addr, &request).await
}

pub async fn delete(addr: &str, path: &str) -> Result<RawResponse, TransportError> {
    let request = format!("DELETE {path} HTTP/1.1\r\nHost: {addr}\r\n\r\n");
    send(addr, &request).await
}

async fn send(addr: &str, request: &str) -> Result<RawResponse, TransportError> {
    tokio::time::timeout(REQUEST_TIMEOUT, send_inner(addr, request))
        .await
        .map_err(|_| TransportError::Timeout)?
}

async fn send_inner(addr: &str, request: &str) -> Result<RawResponse, TransportError> {
    let mut stream =
        TcpStream::connect(addr).await.map_err(|e| TransportError::Connect(format!("{addr}: {e}")))?;
    stream.write_all(request.as_bytes()).await.map_err(|e| TransportError::Io(e.to_string()))?;

    let mut reader = BufReader::new(&mut stream);
    let mut status_line = String::new();
    reader.read_line(&mut status_line).await.map_err(|e| TransportError::Io(e.to_string()))?;
    let status =
        status_line.split_whitespace().nth(1).and_then(|s| s.parse::<u16>().ok()).unwrap_or(0);

    let mut content_length: usize = 0;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).await.map_err(|e| TransportError::Io(e.to_string()))?;
        if line == "\r\n" || line.is_empty() {
            break;
        }
        let lower = line.to_ascii_lowercase();
        if let Some(val) = lower.strip_prefix("content-length:") {
            content_length = val.trim().parse().unwrap_or(0);
        }
    }

    let body = if content_length > 0 {
        let mut buf = vec![0u8; content_length];
        reader.read_exact(&mut buf).await.map_err(|e| TransportError::Io(e.to_string()))?;
        String::from_utf8_lossy(&buf).into_owned()
    } else {
        String::new()
    };

    Ok(RawResponse { status, body })
}
