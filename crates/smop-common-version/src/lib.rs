// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Build information and the SMoP API version policy.
//!
//! Every request the client sends carries the API version it was built
//! against. The compiled-in [`DEFAULT_API_VERSION`] can be pinned to another
//! date through `SMOP_API_VERSION` while a backend rollout is in flight.

shadow_rs::shadow!(build);

use chrono::NaiveDate;
use thiserror::Error;

/// Platform string in `{os}-{arch}` format, e.g. "linux-x86_64".
pub const PLATFORM: &str = env!("SMOP_PLATFORM");

/// SMoP API version this client speaks.
pub const DEFAULT_API_VERSION: &str = "2024-10-01";

/// Environment variable that overrides [`DEFAULT_API_VERSION`].
pub const API_VERSION_ENV: &str = "SMOP_API_VERSION";

/// HTTP header names.
pub mod headers {
	pub const API_VERSION: &str = "X-SMoP-API-Version";
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VersionError {
	#[error("SMOP_API_VERSION is set but empty")]
	Empty,

	#[error("invalid SMoP API version {value:?}: expected YYYY-MM-DD")]
	Malformed { value: String },
}

/// Compile-time build information.
#[derive(Debug, Clone, Copy)]
pub struct BuildInfo {
	pub version: &'static str,
	pub git_sha: &'static str,
	pub build_timestamp: &'static str,
	pub platform: &'static str,
}

impl BuildInfo {
	#[allow(clippy::const_is_empty)]
	pub const fn current() -> Self {
		Self {
			version: build::PKG_VERSION,
			git_sha: if build::SHORT_COMMIT.is_empty() {
				"unknown"
			} else {
				build::SHORT_COMMIT
			},
			build_timestamp: build::BUILD_TIME,
			platform: PLATFORM,
		}
	}
}

/// The API version to send with every request.
///
/// Reads `SMOP_API_VERSION`, falling back to [`DEFAULT_API_VERSION`].
pub fn current_api_version() -> Result<String, VersionError> {
	resolve_api_version(std::env::var(API_VERSION_ENV).ok().as_deref())
}

/// Apply the version policy to an optional override value.
pub fn resolve_api_version(override_value: Option<&str>) -> Result<String, VersionError> {
	let Some(raw) = override_value else {
		return Ok(DEFAULT_API_VERSION.to_string());
	};

	let value = raw.trim();
	if value.is_empty() {
		return Err(VersionError::Empty);
	}

	NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| VersionError::Malformed {
		value: value.to_string(),
	})?;

	Ok(value.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_version_is_a_valid_date() {
		assert_eq!(
			resolve_api_version(Some(DEFAULT_API_VERSION)).unwrap(),
			DEFAULT_API_VERSION
		);
	}

	#[test]
	fn no_override_uses_default() {
		assert_eq!(resolve_api_version(None).unwrap(), DEFAULT_API_VERSION);
	}

	#[test]
	fn override_is_trimmed() {
		assert_eq!(
			resolve_api_version(Some(" 2025-03-15\n")).unwrap(),
			"2025-03-15"
		);
	}

	#[test]
	fn empty_override_is_rejected() {
		assert_eq!(resolve_api_version(Some("  ")), Err(VersionError::Empty));
	}

	#[test]
	fn malformed_override_is_rejected() {
		for value in ["latest", "2025-13-01", "2025/01/01", "v2"] {
			assert!(
				matches!(
					resolve_api_version(Some(value)),
					Err(VersionError::Malformed { .. })
				),
				"{value} should be rejected"
			);
		}
	}

	#[test]
	fn platform_format_is_valid() {
		assert!(PLATFORM.contains('-'));
	}

	#[test]
	fn build_info_has_version() {
		assert!(!BuildInfo::current().version.is_empty());
	}
}
