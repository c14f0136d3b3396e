// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wire types for the SMoP KV API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use smop_common_secret::SecretString;

/// A single key/value secret.
///
/// Fields other than `key` and `value` are backend-defined and kept verbatim
/// in `extra`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Kv {
	pub key: String,
	pub value: SecretString,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

/// One entry of a folder listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KvListItem {
	/// Empty when the backend omits it.
	#[serde(default)]
	pub key: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub folder_path: Option<String>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

/// Body of a successful list call.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct KvListResponse {
	#[serde(default)]
	pub data: Option<Vec<KvListItem>>,
	#[serde(default)]
	pub error: Option<String>,
}

/// Query parameters for a single-secret lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetKvByPathParams {
	pub folder_name: Option<String>,
}

impl GetKvByPathParams {
	pub fn new(folder_path: Option<&str>) -> Self {
		Self {
			folder_name: named_folder(folder_path),
		}
	}
}

/// Query parameters for a folder listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetKvsParams {
	pub path: Option<String>,
}

impl GetKvsParams {
	pub fn new(folder_path: Option<&str>) -> Self {
		Self {
			path: named_folder(folder_path),
		}
	}
}

fn named_folder(folder_path: Option<&str>) -> Option<String> {
	folder_path
		.filter(|folder| !folder.is_empty())
		.map(str::to_string)
}

/// Folder used in error paths and log fields; root is `""`.
pub fn path_or_default(folder_path: Option<&str>) -> &str {
	folder_path.unwrap_or_default()
}

/// `folder/name`, as reported in errors for single-secret lookups.
pub fn full_secret_path(folder: &str, name: &str) -> String {
	format!("{folder}/{name}")
}
