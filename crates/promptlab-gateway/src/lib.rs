// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for Promptlab.
//!
//! Application failures are reported with HTTP 200 and a
//! `{success: false, error, errorType, errorCode}` body, including request
//! bodies that fail to deserialize. Unknown routes keep axum's status codes.

pub mod auth;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod server;

pub use error::{ApiError, ApiJson};
pub use server::{GatewayState, ServerConfig, build_router, start_server};
