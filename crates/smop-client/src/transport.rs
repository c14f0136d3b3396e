// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Raw HTTP access to the SMoP KV endpoints.
//!
//! The [`Transport`] trait is the seam between request/response handling in
//! [`crate::SmopClient`] and the wire. [`HttpTransport`] is the `reqwest`
//! implementation used in production; tests substitute their own.

use std::fmt;
use std::io;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{StatusCode, Url};
use tracing::{debug, trace};

use crate::editor::RequestEditorFn;
use crate::error::TransportError;
use crate::types::{GetKvByPathParams, GetKvsParams};

/// Streaming response body.
pub type ResponseBody = BoxStream<'static, Result<Bytes, io::Error>>;

/// An HTTP response whose body has not been read yet.
pub struct RawResponse {
	pub status: StatusCode,
	pub headers: HeaderMap,
	pub body: ResponseBody,
}

impl RawResponse {
	pub fn new(status: StatusCode, headers: HeaderMap, body: ResponseBody) -> Self {
		Self {
			status,
			headers,
			body,
		}
	}

	/// A response with a fully buffered body.
	pub fn from_bytes(status: StatusCode, content_type: Option<&str>, body: impl Into<Bytes>) -> Self {
		let mut headers = HeaderMap::new();
		if let Some(value) = content_type.and_then(|ct| HeaderValue::from_str(ct).ok()) {
			headers.insert(CONTENT_TYPE, value);
		}
		let body: Bytes = body.into();
		Self::new(status, headers, stream::once(async move { Ok::<_, io::Error>(body) }).boxed())
	}

	/// The `Content-Type` header, or `""` when absent or not valid UTF-8.
	pub fn content_type(&self) -> &str {
		self
			.headers
			.get(CONTENT_TYPE)
			.and_then(|value| value.to_str().ok())
			.unwrap_or_default()
	}
}

impl fmt::Debug for RawResponse {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RawResponse")
			.field("status", &self.status)
			.field("content_type", &self.content_type())
			.finish_non_exhaustive()
	}
}

/// Raw access to the KV endpoints.
///
/// Implementations apply `editors` in order to every request and return the
/// response without inspecting status or body.
#[async_trait]
pub trait Transport: Send + Sync {
	/// Fetch one secret by name.
	async fn get_kv_by_path(
		&self,
		base_url: &Url,
		name: &str,
		params: &GetKvByPathParams,
		editors: &[RequestEditorFn],
	) -> Result<RawResponse, TransportError>;

	/// List the secrets in a folder.
	async fn get_kvs(
		&self,
		base_url: &Url,
		params: &GetKvsParams,
		editors: &[RequestEditorFn],
	) -> Result<RawResponse, TransportError>;
}

/// `reqwest`-backed transport.
///
/// Routes:
/// - `GET {base}/kv/by-path/{name}?folderName={folder}`
/// - `GET {base}/kvs?path={folder}`
#[derive(Clone)]
pub struct HttpTransport {
	http_client: reqwest::Client,
	editors: Vec<RequestEditorFn>,
}

impl HttpTransport {
	pub fn new(http_client: reqwest::Client) -> Self {
		Self {
			http_client,
			editors: Vec::new(),
		}
	}

	/// Append an editor that runs on every request, before per-call editors.
	pub fn with_request_editor(mut self, editor: RequestEditorFn) -> Self {
		self.editors.push(editor);
		self
	}

	async fn send(&self, url: Url, editors: &[RequestEditorFn]) -> Result<RawResponse, TransportError> {
		let mut request = self
			.http_client
			.get(url)
			.header(ACCEPT, "application/json")
			.build()?;

		for editor in self.editors.iter().chain(editors) {
			editor(&mut request)?;
		}

		debug!(url = %request.url(), "sending SMoP request");
		let response = self.http_client.execute(request).await?;

		let status = response.status();
		let headers = response.headers().clone();
		trace!(status = %status, ?headers, "received SMoP response headers");

		let body = response
			.bytes_stream()
			.map(|chunk| chunk.map_err(io::Error::other))
			.boxed();

		Ok(RawResponse::new(status, headers, body))
	}
}

impl fmt::Debug for HttpTransport {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("HttpTransport")
			.field("editors", &self.editors.len())
			.finish_non_exhaustive()
	}
}

#[async_trait]
impl Transport for HttpTransport {
	async fn get_kv_by_path(
		&self,
		base_url: &Url,
		name: &str,
		params: &GetKvByPathParams,
		editors: &[RequestEditorFn],
	) -> Result<RawResponse, TransportError> {
		let mut url = endpoint(base_url, &["kv", "by-path", name])?;
		if let Some(folder) = &params.folder_name {
			url.query_pairs_mut().append_pair("folderName", folder);
		}
		self.send(url, editors).await
	}

	async fn get_kvs(
		&self,
		base_url: &Url,
		params: &GetKvsParams,
		editors: &[RequestEditorFn],
	) -> Result<RawResponse, TransportError> {
		let mut url = endpoint(base_url, &["kvs"])?;
		if let Some(path) = &params.path {
			url.query_pairs_mut().append_pair("path", path);
		}
		self.send(url, editors).await
	}
}

/// Append percent-encoded path segments to the base URL.
fn endpoint(base_url: &Url, segments: &[&str]) -> Result<Url, TransportError> {
	let mut url = base_url.clone();
	url
		.path_segments_mut()
		.map_err(|_| TransportError::InvalidUrl {
			base_url: base_url.to_string(),
		})?
		.pop_if_empty()
		.extend(segments);
	Ok(url)
}
