// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SMoP client: secret lookups and folder listings.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use reqwest::{StatusCode, Url};
use smop_common_secret::SecretString;
use tracing::{debug, instrument, warn};

use crate::classify::api_error_for_response;
use crate::context::RequestContext;
use crate::editor::{request_editor, with_api_version_header, RequestEditorFn};
use crate::error::{SmopError, SmopResult};
use crate::reader::read_response_body;
use crate::transport::{HttpTransport, Transport};
use crate::types::{
	full_secret_path, path_or_default, GetKvByPathParams, GetKvsParams, Kv, KvListItem,
	KvListResponse,
};

/// Default timeout applied by the built-in HTTP client.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const FETCH_SECRET: &str = "fetch secret";
const LIST_SECRETS: &str = "list secrets";

/// Options accepted by [`SmopClient::new`].
pub enum ClientOption {
	/// Use this HTTP client instead of building one.
	HttpClient(reqwest::Client),
	/// Run this editor on every request, after the API version header.
	RequestEditor(RequestEditorFn),
	/// Request timeout of the built-in HTTP client.
	Timeout(Duration),
	/// User-Agent of the built-in HTTP client.
	UserAgent(String),
	/// Accept `http://` server URLs (in-cluster traffic, tests).
	AllowInsecure,
}

#[derive(Default)]
struct Settings {
	http_client: Option<reqwest::Client>,
	editors: Vec<RequestEditorFn>,
	timeout: Option<Duration>,
	user_agent: Option<String>,
	allow_insecure: bool,
}

impl Settings {
	fn from_options(options: impl IntoIterator<Item = ClientOption>) -> Self {
		let mut settings = Self::default();
		for option in options {
			match option {
				ClientOption::HttpClient(client) => settings.http_client = Some(client),
				ClientOption::RequestEditor(editor) => settings.editors.push(editor),
				ClientOption::Timeout(timeout) => settings.timeout = Some(timeout),
				ClientOption::UserAgent(user_agent) => settings.user_agent = Some(user_agent),
				ClientOption::AllowInsecure => settings.allow_insecure = true,
			}
		}
		settings
	}

	fn http_client(&mut self) -> SmopResult<reqwest::Client> {
		if let Some(client) = self.http_client.take() {
			return Ok(client);
		}

		let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
		let built = match self.user_agent.take() {
			Some(user_agent) => smop_common_http::builder_with_user_agent(user_agent)
				.timeout(timeout)
				.build(),
			None => smop_common_http::new_client_with_timeout(timeout),
		};
		built.map_err(|e| SmopError::Configuration(format!("failed to create SMoP HTTP client: {e}")))
	}
}

/// Client for the SMoP KV API.
///
/// Cheap to share: wrap it in an `Arc` and call it from any number of tasks.
pub struct SmopClient {
	transport: Arc<dyn Transport>,
	base_url: RwLock<Url>,
	token: SecretString,
	allow_insecure: bool,
}

impl SmopClient {
	/// Build a client for `server` authenticating with `token`.
	///
	/// `server` may omit the scheme (`https` is assumed). Plain `http` is
	/// rejected unless [`ClientOption::AllowInsecure`] is given. No network
	/// I/O happens here.
	pub fn new(
		server: &str,
		token: impl Into<SecretString>,
		options: impl IntoIterator<Item = ClientOption>,
	) -> SmopResult<Self> {
		let mut settings = Settings::from_options(options);
		let base_url = normalize_base_url(server, settings.allow_insecure)?;

		let api_version = smop_common_version::current_api_version().map_err(|e| {
			SmopError::Configuration(format!("failed to get API version for SMoP client: {e}"))
		})?;
		let version_editor = with_api_version_header(&api_version).map_err(|e| {
			SmopError::Configuration(format!("failed to build API version header: {e}"))
		})?;

		let mut transport = HttpTransport::new(settings.http_client()?).with_request_editor(version_editor);
		for editor in settings.editors.drain(..) {
			transport = transport.with_request_editor(editor);
		}

		debug!(base_url = %base_url, api_version = %api_version, "created SMoP client");

		Ok(Self {
			transport: Arc::new(transport),
			base_url: RwLock::new(base_url),
			token: token.into(),
			allow_insecure: settings.allow_insecure,
		})
	}

	/// Build a client on top of an existing transport.
	///
	/// The transport is responsible for any version headers of its own.
	pub fn with_transport(
		server: &str,
		token: impl Into<SecretString>,
		transport: Arc<dyn Transport>,
		allow_insecure: bool,
	) -> SmopResult<Self> {
		Ok(Self {
			transport,
			base_url: RwLock::new(normalize_base_url(server, allow_insecure)?),
			token: token.into(),
			allow_insecure,
		})
	}

	/// The server URL, without a trailing slash.
	pub fn base_url(&self) -> String {
		let url = self.current_base_url();
		url.as_str().trim_end_matches('/').to_string()
	}

	/// Replace the server URL. Validation matches [`SmopClient::new`].
	pub fn set_base_url(&self, url: &str) -> SmopResult<()> {
		let url = normalize_base_url(url, self.allow_insecure)?;
		*self.base_url.write().unwrap_or_else(PoisonError::into_inner) = url;
		Ok(())
	}

	fn current_base_url(&self) -> Url {
		self
			.base_url
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.clone()
	}

	/// Fetch the secret `name` in `folder_path` (root when `None` or empty).
	#[instrument(skip(self, ctx), fields(folder = path_or_default(folder_path)))]
	pub async fn get_secret(
		&self,
		ctx: &RequestContext,
		name: &str,
		folder_path: Option<&str>,
	) -> SmopResult<Kv> {
		if name.is_empty() {
			return Err(SmopError::InvalidRequest(
				"secret name must not be empty".to_string(),
			));
		}

		let path = path_or_default(folder_path);
		let target = format!("{name:?} at {path:?}");
		let params = GetKvByPathParams::new(folder_path);
		let editor = request_editor(&self.token).map_err(SmopError::AuthSetup)?;
		let base_url = self.current_base_url();

		let response = ctx
			.run(
				self
					.transport
					.get_kv_by_path(&base_url, name, &params, std::slice::from_ref(&editor)),
			)
			.await
			.map_err(|source| SmopError::Transport {
				operation: FETCH_SECRET,
				target: target.clone(),
				source,
			})?;

		let status = response.status;
		let content_type = response.content_type().to_string();
		debug!(status = %status, content_type = %content_type, "received secret response");

		let body = ctx
			.run(read_response_body(response))
			.await
			.map_err(|source| SmopError::TransportRead {
				operation: FETCH_SECRET,
				target: target.clone(),
				source,
			})?;

		if status == StatusCode::OK && content_type.contains("json") {
			return serde_json::from_slice::<Kv>(&body).map_err(|source| SmopError::Decode {
				operation: FETCH_SECRET,
				target,
				source,
			});
		}

		let full_path = full_secret_path(path, name);
		Err(api_error_for_response(&body, &content_type, status.as_u16(), &full_path).into())
	}

	/// List the secrets in `folder_path` (root when `None` or empty).
	///
	/// An empty folder yields an empty `Vec`. Items keep the backend's order.
	#[instrument(skip(self, ctx), fields(folder = path_or_default(folder_path)))]
	pub async fn get_secrets(
		&self,
		ctx: &RequestContext,
		folder_path: Option<&str>,
	) -> SmopResult<Vec<KvListItem>> {
		let path = path_or_default(folder_path);
		let target = format!("at {path:?}");
		let params = GetKvsParams::new(folder_path);
		let editor = request_editor(&self.token).map_err(SmopError::AuthSetup)?;
		let base_url = self.current_base_url();

		let response = ctx
			.run(
				self
					.transport
					.get_kvs(&base_url, &params, std::slice::from_ref(&editor)),
			)
			.await
			.map_err(|source| SmopError::Transport {
				operation: LIST_SECRETS,
				target: target.clone(),
				source,
			})?;

		let status = response.status;
		let content_type = response.content_type().to_string();
		debug!(status = %status, content_type = %content_type, "received list response");

		let body = ctx
			.run(read_response_body(response))
			.await
			.map_err(|source| SmopError::TransportRead {
				operation: LIST_SECRETS,
				target: target.clone(),
				source,
			})?;

		if status == StatusCode::OK && content_type.contains("json") {
			let listing: KvListResponse =
				serde_json::from_slice(&body).map_err(|source| SmopError::Decode {
					operation: LIST_SECRETS,
					target,
					source,
				})?;

			if let Some(embedded) = listing.error.as_deref().filter(|e| !e.is_empty()) {
				warn!(error = embedded, "SMoP list response carried an embedded error");
			}

			let items = listing.data.unwrap_or_default();
			debug!(count = items.len(), "listed secrets");
			return Ok(items);
		}

		Err(api_error_for_response(&body, &content_type, status.as_u16(), path).into())
	}
}

impl fmt::Debug for SmopClient {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SmopClient")
			.field("base_url", &self.base_url())
			.field("token", &self.token)
			.field("allow_insecure", &self.allow_insecure)
			.finish_non_exhaustive()
	}
}

/// Validate a server URL and bring it into canonical form.
///
/// - a missing scheme becomes `https`
/// - a host is required; credentials, query and fragment are rejected
/// - `http` only when `allow_insecure`
/// - trailing slashes are dropped from the path
pub fn normalize_base_url(raw: &str, allow_insecure: bool) -> SmopResult<Url> {
	let trimmed = raw.trim();
	if trimmed.is_empty() {
		return Err(SmopError::InvalidConfiguration(
			"SMoP server URL is empty".to_string(),
		));
	}

	let candidate = if trimmed.contains("://") {
		trimmed.to_string()
	} else {
		format!("https://{trimmed}")
	};

	let mut url = Url::parse(&candidate).map_err(|e| {
		SmopError::InvalidConfiguration(format!("failed to parse SMoP server URL {raw:?}: {e}"))
	})?;

	match url.scheme() {
		"https" => {}
		"http" if allow_insecure => {}
		"http" => {
			return Err(SmopError::InvalidConfiguration(format!(
				"SMoP server URL {raw:?} must use https"
			)))
		}
		other => {
			return Err(SmopError::InvalidConfiguration(format!(
				"unsupported scheme {other:?} in SMoP server URL {raw:?}"
			)))
		}
	}

	if url.host_str().map_or(true, str::is_empty) {
		return Err(SmopError::InvalidConfiguration(format!(
			"SMoP server URL {raw:?} must include a host"
		)));
	}

	if !url.username().is_empty() || url.password().is_some() {
		return Err(SmopError::InvalidConfiguration(
			"SMoP server URL must not embed credentials".to_string(),
		));
	}

	if url.query().is_some() || url.fragment().is_some() {
		return Err(SmopError::InvalidConfiguration(format!(
			"SMoP server URL {raw:?} must not have a query or fragment"
		)));
	}

	let path = url.path().trim_end_matches('/').to_string();
	url.set_path(&path);
	Ok(url)
}
