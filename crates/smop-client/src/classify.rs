// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Turning unsuccessful responses into [`ApiError`]s.

use serde_json::{Map, Value};
use tracing::warn;

use crate::error::ApiError;

/// Outcome of inspecting an error body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
	/// The body carried a usable error message.
	Classified(ApiError),
	/// The body could not be interpreted; use [`fallback_api_error`].
	Unclassifiable,
}

/// Best-effort decode of a JSON error envelope.
///
/// The message is the first non-empty string among `message`, `error`,
/// `error.message` and `detail`.
pub fn classify_api_error(body: &[u8], path: &str, status: u16) -> Classification {
	let Ok(Value::Object(envelope)) = serde_json::from_slice::<Value>(body) else {
		return Classification::Unclassifiable;
	};

	match envelope_message(&envelope) {
		Some(message) => Classification::Classified(ApiError::new(status, message, path)),
		None => Classification::Unclassifiable,
	}
}

/// Generic error for responses that could not be classified.
pub fn fallback_api_error(status: u16, content_type: &str, path: &str) -> ApiError {
	let content_type = if content_type.is_empty() {
		"<none>"
	} else {
		content_type
	};
	ApiError::new(
		status,
		format!("unexpected response with content type {content_type:?} (HTTP {status})"),
		path,
	)
}

/// Classify when the body is JSON, otherwise fall back.
pub(crate) fn api_error_for_response(
	body: &[u8],
	content_type: &str,
	status: u16,
	path: &str,
) -> ApiError {
	if content_type.contains("json") {
		if let Classification::Classified(err) = classify_api_error(body, path, status) {
			warn!(status, path, message = err.message(), "SMoP API returned an error");
			return err;
		}
	}

	warn!(
		status,
		path,
		content_type,
		body_len = body.len(),
		"unclassifiable SMoP error response"
	);
	fallback_api_error(status, content_type, path)
}

fn envelope_message(envelope: &Map<String, Value>) -> Option<String> {
	let text = |value: Option<&Value>| {
		value
			.and_then(Value::as_str)
			.map(str::trim)
			.filter(|s| !s.is_empty())
			.map(str::to_string)
	};

	text(envelope.get("message"))
		.or_else(|| text(envelope.get("error")))
		.or_else(|| {
			envelope
				.get("error")
				.and_then(Value::as_object)
				.and_then(|nested| text(nested.get("message")))
		})
		.or_else(|| text(envelope.get("detail")))
}
