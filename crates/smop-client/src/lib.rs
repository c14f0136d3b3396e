// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Client for the SMoP secret-management API.
//!
//! [`SmopClient`] fetches a single secret by name and lists the secrets in a
//! folder. Every request carries a bearer token and the SMoP API version
//! header. Unsuccessful responses become [`ApiError`]s carrying the HTTP
//! status, the backend's message and the path that was requested.
//!
//! # Example
//!
//! ```ignore
//! use smop_client::{RequestContext, SmopClient};
//! use std::time::Duration;
//!
//! let client = SmopClient::new("smop.example.com", token, [])?;
//! let ctx = RequestContext::background().with_timeout(Duration::from_secs(10));
//!
//! let kv = client.get_secret(&ctx, "db-password", Some("team/app")).await?;
//! let items = client.get_secrets(&ctx, Some("team/app")).await?;
//! ```

mod classify;
mod client;
mod context;
mod editor;
mod error;
mod reader;
mod transport;
mod types;

pub use classify::{classify_api_error, fallback_api_error, Classification};
pub use client::{normalize_base_url, ClientOption, SmopClient, DEFAULT_TIMEOUT};
pub use context::{Interrupted, RequestContext};
pub use editor::{header_editor, request_editor, with_api_version_header, RequestEditorFn};
pub use error::{ApiError, ReadError, RequestEditorError, SmopError, SmopResult, TransportError};
pub use reader::{read_response_body, read_response_body_limited, MAX_RESPONSE_BYTES};
pub use transport::{HttpTransport, RawResponse, ResponseBody, Transport};
pub use types::{full_secret_path, path_or_default, GetKvByPathParams, GetKvsParams, Kv, KvListItem};

pub use smop_common_secret::SecretString;
