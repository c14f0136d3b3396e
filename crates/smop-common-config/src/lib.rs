// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration primitives shared by the SMoP client crates.
//!
//! - [`load_secret_env`] / [`require_secret_env`]: read a token from `VAR` or
//!   from the file named by `VAR_FILE` (Kubernetes secret mounts)
//! - [`Secret`] and [`SecretString`], re-exported from `smop-common-secret`

pub mod env;

pub use smop_common_secret::{Secret, SecretString, REDACTED};

pub use env::{load_secret_env, require_secret_env, RequiredSecretError, SecretEnvError};
