// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request editors: hooks that mutate an outgoing request before it is sent.

use std::sync::Arc;

use reqwest::header::{HeaderName, HeaderValue, AUTHORIZATION};
use smop_common_secret::SecretString;
use smop_common_version::headers;

use crate::error::RequestEditorError;

/// Hook applied to every outgoing request, in registration order.
pub type RequestEditorFn =
	Arc<dyn Fn(&mut reqwest::Request) -> Result<(), RequestEditorError> + Send + Sync>;

/// Build the editor that authenticates a single call.
///
/// Called once per request so a rotated token is picked up without
/// rebuilding the client.
pub fn request_editor(token: &SecretString) -> Result<RequestEditorFn, RequestEditorError> {
	if token.is_blank() {
		return Err(RequestEditorError::EmptyToken);
	}

	let bearer = SecretString::new(format!("Bearer {}", token.expose()));
	let mut value =
		HeaderValue::from_str(bearer.expose()).map_err(|_| RequestEditorError::InvalidHeaderValue {
			header: AUTHORIZATION.as_str().to_string(),
		})?;
	value.set_sensitive(true);

	Ok(Arc::new(
		move |request: &mut reqwest::Request| -> Result<(), RequestEditorError> {
			request.headers_mut().insert(AUTHORIZATION, value.clone());
			Ok(())
		},
	))
}

/// Build the editor that stamps the SMoP API version on every request.
pub fn with_api_version_header(version: &str) -> Result<RequestEditorFn, RequestEditorError> {
	header_editor(headers::API_VERSION, version)
}

/// Editor that sets `name: value`, replacing any earlier value.
pub fn header_editor(name: &str, value: &str) -> Result<RequestEditorFn, RequestEditorError> {
	let name =
		HeaderName::from_bytes(name.as_bytes()).map_err(|_| RequestEditorError::InvalidHeaderName {
			header: name.to_string(),
		})?;
	let value = HeaderValue::from_str(value).map_err(|_| RequestEditorError::InvalidHeaderValue {
		header: name.as_str().to_string(),
	})?;

	Ok(Arc::new(
		move |request: &mut reqwest::Request| -> Result<(), RequestEditorError> {
			request.headers_mut().insert(name.clone(), value.clone());
			Ok(())
		},
	))
}
