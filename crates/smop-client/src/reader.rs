// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Draining response bodies.

use bytes::{Bytes, BytesMut};
use futures::StreamExt;

use crate::error::ReadError;
use crate::transport::RawResponse;

/// Largest body the client will buffer.
pub const MAX_RESPONSE_BYTES: usize = 10 * 1024 * 1024;

/// Read the whole body of `response`, consuming it.
///
/// The response is dropped on every return path, which releases the
/// underlying connection.
pub async fn read_response_body(response: RawResponse) -> Result<Bytes, ReadError> {
	read_response_body_limited(response, MAX_RESPONSE_BYTES).await
}

/// [`read_response_body`] with an explicit size limit.
pub async fn read_response_body_limited(
	response: RawResponse,
	limit: usize,
) -> Result<Bytes, ReadError> {
	let RawResponse { mut body, .. } = response;
	let mut buffer = BytesMut::new();

	while let Some(chunk) = body.next().await {
		let chunk = chunk?;
		if buffer.len() + chunk.len() > limit {
			return Err(ReadError::TooLarge { limit });
		}
		buffer.extend_from_slice(&chunk);
	}

	Ok(buffer.freeze())
}
