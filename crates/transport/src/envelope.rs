// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The wire envelope every JSON body is wrapped in.
//!
//! The source's `StandardResponse.Response` is an opaque value; here the
//! envelope is generic over its payload instead, so callers never decode
//! twice.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardResponse<T> {
    pub http_status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_msg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<T>,
}

impl<T> StandardResponse<T> {
    pub fn ok(status: u16, payload: T) -> Self {
        Self { http_status_code: status, error_msg: None, response: Some(payload) }
    }
}

impl StandardResponse<()> {
    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self { http_status_code: status, error_msg: Some(message.into()), response: None }
    }
}
