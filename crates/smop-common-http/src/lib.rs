// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared `reqwest` client construction.
//!
//! All SMoP HTTP traffic identifies itself as
//! `smop-client/{platform}/{git_sha}` and never follows redirects.

mod client;

pub use client::{builder, builder_with_user_agent, new_client_with_timeout, user_agent};
