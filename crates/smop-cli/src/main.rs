// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use smop_client::{ClientOption, RequestContext, SmopClient};
use smop_common_config::require_secret_env;
use smop_common_version::BuildInfo;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const TOKEN_ENV: &str = "SMOP_TOKEN";

/// smop - read secrets from the SMoP secret-management API
#[derive(Parser, Debug)]
#[command(name = "smop", version, about, long_about = None)]
struct Args {
	/// SMoP server URL (scheme defaults to https)
	#[arg(long, env = "SMOP_SERVER_URL", global = true)]
	server_url: Option<String>,

	/// Per-request timeout in seconds
	#[arg(long, env = "SMOP_TIMEOUT_SECS", default_value_t = 30, global = true)]
	timeout_secs: u64,

	/// Accept plain http server URLs
	#[arg(long, global = true)]
	allow_insecure: bool,

	/// Log level (overrides RUST_LOG)
	#[arg(short, long, global = true)]
	log_level: Option<String>,

	/// Output logs as JSON
	#[arg(long, global = true)]
	json_logs: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Print a single secret
	Get {
		/// Secret name
		name: String,
		/// Folder holding the secret (root when omitted)
		#[arg(long, short)]
		folder: Option<String>,
		/// What to print
		#[arg(long, short, value_enum, default_value_t = OutputFormat::Value)]
		output: OutputFormat,
	},
	/// List the secrets in a folder
	List {
		/// Folder to list (root when omitted)
		#[arg(long, short)]
		folder: Option<String>,
		/// Print the full listing as JSON
		#[arg(long)]
		json: bool,
	},
	/// Show version information
	Version,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
	/// The secret value only
	Value,
	/// `{"key": ..., "value": ...}`
	Json,
}

#[tokio::main]
async fn main() -> Result<()> {
	let args = Args::parse();
	init_tracing(args.log_level.as_deref(), args.json_logs);

	match &args.command {
		Command::Version => {
			println!("{}", format_version_info()?);
			Ok(())
		}
		Command::Get {
			name,
			folder,
			output,
		} => {
			let client = build_client(&args)?;
			let ctx = request_context(&args);
			let kv = client
				.get_secret(&ctx, name, folder.as_deref())
				.await
				.with_context(|| format!("failed to get secret {name:?}"))?;

			match output {
				OutputFormat::Value => println!("{}", kv.value.expose()),
				OutputFormat::Json => {
					let rendered = serde_json::json!({
						"key": kv.key,
						"value": kv.value.expose(),
					});
					println!("{}", serde_json::to_string_pretty(&rendered)?);
				}
			}
			Ok(())
		}
		Command::List { folder, json } => {
			let client = build_client(&args)?;
			let ctx = request_context(&args);
			let items = client
				.get_secrets(&ctx, folder.as_deref())
				.await
				.with_context(|| format!("failed to list secrets in {:?}", folder.as_deref().unwrap_or_default()))?;

			info!(count = items.len(), "listed secrets");
			if *json {
				println!("{}", serde_json::to_string_pretty(&items)?);
			} else {
				for item in &items {
					println!("{}", item.key);
				}
			}
			Ok(())
		}
	}
}

fn init_tracing(log_level: Option<&str>, json_logs: bool) {
	let filter = match log_level {
		Some(level) => EnvFilter::new(format!("smop={level},smop_client={level}")),
		None => EnvFilter::try_from_default_env()
			.unwrap_or_else(|_| EnvFilter::new("smop=info,smop_client=info")),
	};

	if json_logs {
		tracing_subscriber::registry()
			.with(filter)
			.with(fmt::layer().json().with_writer(std::io::stderr))
			.init();
	} else {
		tracing_subscriber::registry()
			.with(filter)
			.with(fmt::layer().compact().with_writer(std::io::stderr))
			.init();
	}
}

fn build_client(args: &Args) -> Result<SmopClient> {
	let server_url = args
		.server_url
		.as_deref()
		.context("no SMoP server configured: pass --server-url or set SMOP_SERVER_URL")?;
	let token = require_secret_env(TOKEN_ENV).context("failed to load SMoP token")?;

	let mut options = vec![ClientOption::Timeout(Duration::from_secs(args.timeout_secs))];
	if args.allow_insecure {
		warn!("plain http allowed for SMoP server");
		options.push(ClientOption::AllowInsecure);
	}

	let client = SmopClient::new(server_url, token, options).context("failed to create SMoP client")?;
	debug!(base_url = %client.base_url(), "SMoP client ready");
	Ok(client)
}

/// Context for one CLI invocation: Ctrl-C cancels, `--timeout-secs` bounds it.
fn request_context(args: &Args) -> RequestContext {
	let cancel = CancellationToken::new();
	let on_interrupt = cancel.clone();
	tokio::spawn(async move {
		if tokio::signal::ctrl_c().await.is_ok() {
			warn!("interrupted, cancelling request");
			on_interrupt.cancel();
		}
	});

	RequestContext::background()
		.with_cancellation(cancel)
		.with_timeout(Duration::from_secs(args.timeout_secs))
}

fn format_version_info() -> Result<String> {
	let info = BuildInfo::current();
	let api_version =
		smop_common_version::current_api_version().context("failed to resolve SMoP API version")?;
	Ok(format!(
		"smop {}\n  commit:      {}\n  built:       {}\n  platform:    {}\n  api version: {}",
		info.version, info.git_sha, info.build_timestamp, info.platform, api_version
	))
}
