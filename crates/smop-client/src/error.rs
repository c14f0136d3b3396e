// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the SMoP client.

use thiserror::Error;

use crate::context::Interrupted;

/// Errors returned by [`crate::SmopClient`].
#[derive(Debug, Error)]
pub enum SmopError {
	/// The server URL (or another construction input) is malformed or insecure.
	#[error("invalid SMoP client configuration: {0}")]
	InvalidConfiguration(String),

	/// A construction-time dependency (API version, HTTP client) is unavailable.
	#[error("SMoP client configuration error: {0}")]
	Configuration(String),

	/// The call arguments are unusable (e.g. an empty secret name).
	#[error("invalid SMoP request: {0}")]
	InvalidRequest(String),

	/// The Authorization header could not be built.
	#[error("failed to create request editor: {0}")]
	AuthSetup(#[source] RequestEditorError),

	/// The HTTP call itself failed, was cancelled or hit its deadline.
	#[error("failed to {operation} {target}: {source}")]
	Transport {
		operation: &'static str,
		target: String,
		#[source]
		source: TransportError,
	},

	/// The response body could not be drained.
	#[error("failed to read {operation} response {target}: {source}")]
	TransportRead {
		operation: &'static str,
		target: String,
		#[source]
		source: ReadError,
	},

	/// A 200 JSON response did not match the expected shape.
	#[error("failed to decode {operation} response {target}: {source}")]
	Decode {
		operation: &'static str,
		target: String,
		#[source]
		source: serde_json::Error,
	},

	/// The backend reported a failure.
	#[error(transparent)]
	Api(#[from] ApiError),
}

impl SmopError {
	/// Whether an outer caller may reasonably repeat the call.
	///
	/// The client itself never retries.
	pub fn is_retryable(&self) -> bool {
		match self {
			SmopError::Transport { source, .. } => source.is_retryable(),
			SmopError::TransportRead { source, .. } => source.is_retryable(),
			SmopError::Api(err) => matches!(err.status_code(), 408 | 429 | 500..=599),
			SmopError::InvalidConfiguration(_)
			| SmopError::Configuration(_)
			| SmopError::InvalidRequest(_)
			| SmopError::AuthSetup(_)
			| SmopError::Decode { .. } => false,
		}
	}

	/// The classified backend error, if this is one.
	pub fn as_api_error(&self) -> Option<&ApiError> {
		match self {
			SmopError::Api(err) => Some(err),
			_ => None,
		}
	}
}

/// Result alias for SMoP client operations.
pub type SmopResult<T> = Result<T, SmopError>;

/// A failure reported by the SMoP backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("SMoP API error (HTTP {status_code}): {message} at path {path:?}")]
pub struct ApiError {
	status_code: u16,
	message: String,
	path: String,
}

impl ApiError {
	pub fn new(status_code: u16, message: impl Into<String>, path: impl Into<String>) -> Self {
		Self {
			status_code,
			message: message.into(),
			path: path.into(),
		}
	}

	pub fn status_code(&self) -> u16 {
		self.status_code
	}

	pub fn message(&self) -> &str {
		&self.message
	}

	/// Folder path, with the secret name appended for single-secret lookups.
	pub fn path(&self) -> &str {
		&self.path
	}
}

/// Failure building or applying a request editor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestEditorError {
	#[error("SMoP token is empty")]
	EmptyToken,

	#[error("value for header {header} contains invalid characters")]
	InvalidHeaderValue { header: String },

	#[error("invalid header name {header:?}")]
	InvalidHeaderName { header: String },
}

/// Failure of the underlying HTTP call.
#[derive(Debug, Error)]
pub enum TransportError {
	#[error("cannot build request URL from {base_url:?}")]
	InvalidUrl { base_url: String },

	#[error(transparent)]
	Editor(#[from] RequestEditorError),

	#[error("HTTP request failed: {0}")]
	Http(#[from] reqwest::Error),

	#[error(transparent)]
	Interrupted(#[from] Interrupted),
}

impl TransportError {
	fn is_retryable(&self) -> bool {
		match self {
			TransportError::Http(err) => err.is_timeout() || err.is_connect() || err.is_request(),
			TransportError::Interrupted(Interrupted::DeadlineExceeded) => true,
			TransportError::Interrupted(Interrupted::Cancelled)
			| TransportError::InvalidUrl { .. }
			| TransportError::Editor(_) => false,
		}
	}
}

/// Failure draining a response body.
#[derive(Debug, Error)]
pub enum ReadError {
	#[error("I/O error reading response body: {0}")]
	Io(#[from] std::io::Error),

	#[error("response body exceeds {limit} bytes")]
	TooLarge { limit: usize },

	#[error(transparent)]
	Interrupted(#[from] Interrupted),
}

impl ReadError {
	fn is_retryable(&self) -> bool {
		match self {
			ReadError::Io(_) | ReadError::Interrupted(Interrupted::DeadlineExceeded) => true,
			ReadError::Interrupted(Interrupted::Cancelled) | ReadError::TooLarge { .. } => false,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn api_error_display_matches_backend_wording() {
		let err = ApiError::new(404, "not found", "team/app/missing");
		assert_eq!(
			err.to_string(),
			r#"SMoP API error (HTTP 404): not found at path "team/app/missing""#
		);
	}

	#[test]
	fn server_errors_are_retryable() {
		for status in [408, 429, 500, 502, 503, 504] {
			let err = SmopError::Api(ApiError::new(status, "boom", "a"));
			assert!(err.is_retryable(), "status {status} should be retryable");
		}
	}

	#[test]
	fn client_errors_are_not_retryable() {
		for status in [400, 401, 403, 404, 422] {
			let err = SmopError::Api(ApiError::new(status, "nope", "a"));
			assert!(!err.is_retryable(), "status {status} should not be retryable");
		}
	}

	#[test]
	fn setup_errors_are_not_retryable() {
		assert!(!SmopError::AuthSetup(RequestEditorError::EmptyToken).is_retryable());
		assert!(!SmopError::InvalidConfiguration("bad url".into()).is_retryable());
		assert!(!SmopError::Configuration("no version".into()).is_retryable());
	}

	#[test]
	fn deadline_is_retryable_but_cancel_is_not() {
		let deadline = SmopError::Transport {
			operation: "fetch secret",
			target: "\"a\" at \"\"".into(),
			source: Interrupted::DeadlineExceeded.into(),
		};
		let cancelled = SmopError::Transport {
			operation: "fetch secret",
			target: "\"a\" at \"\"".into(),
			source: Interrupted::Cancelled.into(),
		};
		assert!(deadline.is_retryable());
		assert!(!cancelled.is_retryable());
	}

	#[test]
	fn read_interruptions_match_transport_interruptions() {
		let read = |source: ReadError| SmopError::TransportRead {
			operation: "fetch secret",
			target: "\"a\" at \"\"".into(),
			source,
		};
		let transport = |source: TransportError| SmopError::Transport {
			operation: "fetch secret",
			target: "\"a\" at \"\"".into(),
			source,
		};

		for interrupted in [Interrupted::Cancelled, Interrupted::DeadlineExceeded] {
			assert_eq!(
				read(interrupted.into()).is_retryable(),
				transport(interrupted.into()).is_retryable(),
				"{interrupted:?}"
			);
		}
		assert!(!read(Interrupted::Cancelled.into()).is_retryable());
		assert!(read(Interrupted::DeadlineExceeded.into()).is_retryable());
		assert!(read(std::io::Error::other("reset").into()).is_retryable());
	}

	#[test]
	fn oversized_body_is_not_retryable() {
		let err = SmopError::TransportRead {
			operation: "list secrets",
			target: "at \"\"".into(),
			source: ReadError::TooLarge { limit: 8 },
		};
		assert!(!err.is_retryable());
	}

	#[test]
	fn as_api_error_only_matches_api_variant() {
		let api = SmopError::Api(ApiError::new(500, "x", "p"));
		assert_eq!(api.as_api_error().map(ApiError::status_code), Some(500));
		assert!(SmopError::InvalidRequest("x".into()).as_api_error().is_none());
	}
}
