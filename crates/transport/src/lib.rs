// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! stv-transport: the HTTP/1.1 wire plumbing shared by the Manager and
//! Worker daemons. Deliberately not a web framework — the protocol here
//! is a closed contract between two processes this codebase owns on
//! both ends, so a hand-rolled client/server pair is the right weight.

#![cfg_attr(test, allow(clippy::unwrap_used))]

mod client;
mod envelope;
mod server;

pub use client::{delete, get, post, RawResponse, TransportError};
pub use envelope::StandardResponse;
pub use server::{serve_tcp, Handler, Request, Response};
