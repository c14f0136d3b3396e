// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! End-to-end behaviour of `SmopClient` against a mock SMoP server.

use std::time::Duration;

use serde_json::json;
use smop_client::{ApiError, ClientOption, RequestContext, SmopClient, SmopError};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "smop_pat_integration";

async fn client_for(server: &MockServer) -> SmopClient {
	SmopClient::new(&server.uri(), TOKEN, [ClientOption::AllowInsecure]).unwrap()
}

fn ctx() -> RequestContext {
	RequestContext::background().with_timeout(Duration::from_secs(5))
}

#[tokio::test]
async fn fetches_root_secret_with_auth_and_version_headers() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/kv/by-path/db-password"))
		.and(header("authorization", format!("Bearer {TOKEN}").as_str()))
		.and(header("x-smop-api-version", "2024-10-01"))
		.and(header("accept", "application/json"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"key": "db-password",
			"value": "s3cr3t",
			"version": 7
		})))
		.expect(1)
		.mount(&server)
		.await;

	let kv = client_for(&server)
		.await
		.get_secret(&ctx(), "db-password", None)
		.await
		.unwrap();

	assert_eq!(kv.key, "db-password");
	assert_eq!(kv.value.expose(), "s3cr3t");
	assert_eq!(kv.extra.get("version"), Some(&json!(7)));

	let requests = server.received_requests().await.unwrap();
	assert_eq!(requests[0].url.query(), None);
}

#[tokio::test]
async fn fetches_secret_in_folder() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/kv/by-path/api-key"))
		.and(query_param("folderName", "team/app"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"key": "api-key",
			"value": "k-123"
		})))
		.expect(1)
		.mount(&server)
		.await;

	let kv = client_for(&server)
		.await
		.get_secret(&ctx(), "api-key", Some("team/app"))
		.await
		.unwrap();

	assert_eq!(kv.value.expose(), "k-123");
}

#[tokio::test]
async fn missing_secret_is_classified_api_error() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/kv/by-path/missing"))
		.and(query_param("folderName", "team/app"))
		.respond_with(ResponseTemplate::new(404).set_body_json(json!({
			"message": "secret not found"
		})))
		.mount(&server)
		.await;

	let err = client_for(&server)
		.await
		.get_secret(&ctx(), "missing", Some("team/app"))
		.await
		.unwrap_err();

	assert_eq!(
		err.as_api_error(),
		Some(&ApiError::new(404, "secret not found", "team/app/missing"))
	);
	assert!(!err.is_retryable());
	assert_eq!(
		err.to_string(),
		r#"SMoP API error (HTTP 404): secret not found at path "team/app/missing""#
	);
}

#[tokio::test]
async fn html_error_page_falls_back_to_generic_error() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/kv/by-path/db-password"))
		.respond_with(
			ResponseTemplate::new(500).set_body_raw(
				"<html><body><h1>Internal Server Error</h1></body></html>",
				"text/html",
			),
		)
		.mount(&server)
		.await;

	let err = client_for(&server)
		.await
		.get_secret(&ctx(), "db-password", Some("team"))
		.await
		.unwrap_err();

	let api = err.as_api_error().unwrap();
	assert_eq!(api.status_code(), 500);
	assert_eq!(api.path(), "team/db-password");
	assert!(api.message().contains("text/html"));
	assert!(err.is_retryable());
}

#[tokio::test]
async fn lists_secrets_in_backend_order() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/kvs"))
		.and(query_param("path", "team/app"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"data": [
				{ "key": "zeta", "id": "kv_3", "folderPath": "team/app" },
				{ "key": "alpha", "id": "kv_1", "folderPath": "team/app" }
			]
		})))
		.expect(1)
		.mount(&server)
		.await;

	let items = client_for(&server)
		.await
		.get_secrets(&ctx(), Some("team/app"))
		.await
		.unwrap();

	let keys: Vec<&str> = items.iter().map(|item| item.key.as_str()).collect();
	assert_eq!(keys, ["zeta", "alpha"]);
	assert_eq!(items[0].id.as_deref(), Some("kv_3"));
	assert_eq!(items[0].folder_path.as_deref(), Some("team/app"));
}

#[tokio::test]
async fn empty_folder_lists_nothing() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/kvs"))
		.and(query_param("path", "empty-folder"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
		.mount(&server)
		.await;

	let items = client_for(&server)
		.await
		.get_secrets(&ctx(), Some("empty-folder"))
		.await
		.unwrap();

	assert!(items.is_empty());
}

#[tokio::test]
async fn embedded_list_error_is_not_fatal() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/kvs"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"data": [{ "key": "only" }],
			"error": "some folders were skipped"
		})))
		.mount(&server)
		.await;

	let items = client_for(&server)
		.await
		.get_secrets(&ctx(), None)
		.await
		.unwrap();

	assert_eq!(items.len(), 1);
}

#[tokio::test]
async fn list_forbidden_reports_folder_path() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/kvs"))
		.respond_with(ResponseTemplate::new(403).set_body_json(json!({
			"error": { "code": "FORBIDDEN", "message": "token lacks read scope" }
		})))
		.mount(&server)
		.await;

	let err = client_for(&server)
		.await
		.get_secrets(&ctx(), Some("restricted"))
		.await
		.unwrap_err();

	assert_eq!(
		err.as_api_error(),
		Some(&ApiError::new(403, "token lacks read scope", "restricted"))
	);
}

#[tokio::test]
async fn base_url_path_prefix_is_kept() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/smop/api/kvs"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
		.expect(1)
		.mount(&server)
		.await;

	let client = SmopClient::new(
		&format!("{}/smop/api/", server.uri()),
		TOKEN,
		[ClientOption::AllowInsecure],
	)
	.unwrap();

	assert!(client.get_secrets(&ctx(), None).await.unwrap().is_empty());
}

#[tokio::test]
async fn set_base_url_redirects_subsequent_calls() {
	let first = MockServer::start().await;
	let second = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/kvs"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
		.expect(0)
		.mount(&first)
		.await;
	Mock::given(method("GET"))
		.and(path("/kvs"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [{ "key": "moved" }] })))
		.expect(1)
		.mount(&second)
		.await;

	let client = client_for(&first).await;
	client.set_base_url(&second.uri()).unwrap();

	let items = client.get_secrets(&ctx(), None).await.unwrap();
	assert_eq!(items[0].key, "moved");
}

#[tokio::test]
async fn custom_request_editor_runs_after_version_header() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/kvs"))
		.and(header("x-smop-api-version", "2099-01-01"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
		.expect(1)
		.mount(&server)
		.await;

	let override_version = smop_client::header_editor("X-SMoP-API-Version", "2099-01-01").unwrap();
	let client = SmopClient::new(
		&server.uri(),
		TOKEN,
		[
			ClientOption::AllowInsecure,
			ClientOption::RequestEditor(override_version),
		],
	)
	.unwrap();

	client.get_secrets(&ctx(), None).await.unwrap();
}

#[tokio::test]
async fn slow_server_hits_deadline() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/kv/by-path/slow"))
		.respond_with(
			ResponseTemplate::new(200)
				.set_body_json(json!({ "key": "slow", "value": "v" }))
				.set_delay(Duration::from_secs(2)),
		)
		.mount(&server)
		.await;

	let ctx = RequestContext::background().with_timeout(Duration::from_millis(50));
	let err = client_for(&server)
		.await
		.get_secret(&ctx, "slow", None)
		.await
		.unwrap_err();

	assert!(matches!(err, SmopError::Transport { .. }));
	assert!(err.to_string().contains("deadline exceeded"));
}

#[tokio::test]
async fn plain_http_is_refused_without_opt_in() {
	let server = MockServer::start().await;
	let err = SmopClient::new(&server.uri(), TOKEN, []).unwrap_err();
	assert!(matches!(err, SmopError::InvalidConfiguration(_)));
}

#[tokio::test]
async fn user_agent_option_is_sent() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/kvs"))
		.and(header("user-agent", "external-secrets/0.10"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
		.expect(1)
		.mount(&server)
		.await;

	let client = SmopClient::new(
		&server.uri(),
		TOKEN,
		[
			ClientOption::AllowInsecure,
			ClientOption::UserAgent("external-secrets/0.10".to_string()),
		],
	)
	.unwrap();

	client.get_secrets(&ctx(), None).await.unwrap();
}

#[tokio::test]
async fn default_user_agent_identifies_client() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/kvs"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
		.mount(&server)
		.await;

	client_for(&server)
		.await
		.get_secrets(&ctx(), None)
		.await
		.unwrap();

	let requests = server.received_requests().await.unwrap();
	let user_agent = requests[0].headers.get("user-agent").unwrap().to_str().unwrap();
	assert!(user_agent.starts_with("smop-client/"));
}
