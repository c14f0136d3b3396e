// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::time::Duration;

use reqwest::{redirect, Client, ClientBuilder};
use smop_common_version::BuildInfo;

/// Client builder with the standard User-Agent and redirects disabled.
///
/// ```ignore
/// let client = smop_common_http::builder()
///     .timeout(Duration::from_secs(10))
///     .build()?;
/// ```
pub fn builder() -> ClientBuilder {
	builder_with_user_agent(user_agent())
}

/// Client builder with a caller-chosen User-Agent.
pub fn builder_with_user_agent(user_agent: impl Into<String>) -> ClientBuilder {
	Client::builder()
		.user_agent(user_agent.into())
		.redirect(redirect::Policy::none())
}

/// Build a client with the standard User-Agent and a request timeout.
pub fn new_client_with_timeout(timeout: Duration) -> reqwest::Result<Client> {
	builder().timeout(timeout).build()
}

/// `smop-client/{platform}/{git_sha}`
pub fn user_agent() -> String {
	let info = BuildInfo::current();
	format!("smop-client/{}/{}", info.platform, info.git_sha)
}
