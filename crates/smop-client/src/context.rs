// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-call cancellation and deadlines.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a call stopped before completing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Interrupted {
	#[error("request cancelled")]
	Cancelled,

	#[error("request deadline exceeded")]
	DeadlineExceeded,
}

/// Cancellation scope for one fetch or list call.
///
/// The deadline is absolute: it covers the HTTP round trip and the body read
/// together.
#[derive(Debug, Clone)]
pub struct RequestContext {
	cancel: CancellationToken,
	deadline: Option<Instant>,
}

impl Default for RequestContext {
	fn default() -> Self {
		Self::background()
	}
}

impl RequestContext {
	/// A context that is never cancelled and has no deadline.
	pub fn background() -> Self {
		Self {
			cancel: CancellationToken::new(),
			deadline: None,
		}
	}

	/// Bind the context to an external token (e.g. a Ctrl-C handler or a
	/// controller shutting down).
	pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
		self.cancel = token;
		self
	}

	/// Set the deadline to `timeout` from now, keeping an earlier one.
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		let deadline = Instant::now() + timeout;
		self.deadline = Some(match self.deadline {
			Some(existing) if existing < deadline => existing,
			_ => deadline,
		});
		self
	}

	pub fn cancellation_token(&self) -> &CancellationToken {
		&self.cancel
	}

	pub fn deadline(&self) -> Option<Instant> {
		self.deadline
	}

	/// Drive `fut` until it completes, the token fires or the deadline passes.
	///
	/// On interruption `fut` is dropped, releasing whatever it owns.
	pub async fn run<F, T, E>(&self, fut: F) -> Result<T, E>
	where
		F: Future<Output = Result<T, E>>,
		E: From<Interrupted>,
	{
		if self.cancel.is_cancelled() {
			return Err(Interrupted::Cancelled.into());
		}

		let deadline = async {
			match self.deadline {
				Some(at) => tokio::time::sleep_until(at).await,
				None => std::future::pending::<()>().await,
			}
		};

		tokio::select! {
			biased;
			_ = self.cancel.cancelled() => Err(Interrupted::Cancelled.into()),
			_ = deadline => Err(Interrupted::DeadlineExceeded.into()),
			output = fut => output,
		}
	}
}
