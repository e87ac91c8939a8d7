// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::path::PathBuf;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio::process::Command;
use tracing::{trace, warn};

use crate::client::{HookTools, Protocol, SettingsMap};
use crate::error::HookToolError;

const RELATION_IDS: &str = "relation-ids";
const RELATION_LIST: &str = "relation-list";
const RELATION_GET: &str = "relation-get";
const RELATION_SET: &str = "relation-set";
const CONFIG_GET: &str = "config-get";
const UNIT_GET: &str = "unit-get";
const JUJU_LOG: &str = "juju-log";
const OPEN_PORT: &str = "open-port";
const CLOSE_PORT: &str = "close-port";

/// Hook tool client implementation using the Juju-provided CLI tools.
///
/// By default tools are resolved from the `PATH` Juju sets up for the
/// hook. A pinned tool directory routes lookups to explicit paths
/// instead, which is how tests and development environments interpose
/// stub tools.
pub struct CommandHookTools {
	tool_dir: Option<PathBuf>,
}

impl CommandHookTools {
	pub fn new() -> Self {
		Self { tool_dir: None }
	}

	/// Resolve tools from `dir` instead of the `PATH`.
	pub fn with_tool_dir(dir: impl Into<PathBuf>) -> Self {
		Self {
			tool_dir: Some(dir.into()),
		}
	}

	fn tool_path(&self, tool: &'static str) -> PathBuf {
		match &self.tool_dir {
			Some(dir) => dir.join(tool),
			None => PathBuf::from(tool),
		}
	}

	/// Runs a hook tool and returns its stdout on success.
	///
	/// Empty stdout maps to `Ok(None)`: the tool had nothing to report.
	async fn run_tool(
		&self,
		tool: &'static str,
		args: &[&str],
	) -> Result<Option<String>, HookToolError> {
		let mut cmd = Command::new(self.tool_path(tool));
		cmd.args(args);

		trace!(cmd = %format!("{} {}", tool, args.join(" ")), "running hook tool");

		let output = cmd.output().await.map_err(|e| {
			if e.kind() == std::io::ErrorKind::NotFound {
				warn!(tool = %tool, "hook tool not found; not inside a hook?");
				HookToolError::ToolNotFound(tool)
			} else {
				HookToolError::Io(e)
			}
		})?;

		if output.status.success() {
			let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
			if stdout.is_empty() {
				Ok(None)
			} else {
				Ok(Some(stdout))
			}
		} else {
			let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
			Err(HookToolError::CommandFailed {
				tool,
				args: args.iter().map(|s| s.to_string()).collect(),
				stderr,
			})
		}
	}

	/// Runs a `--format=json` tool invocation and decodes the output.
	///
	/// Both empty output and JSON `null` decode to `Ok(None)`; Juju emits
	/// `null` when the queried context does not exist.
	async fn run_json_tool<T: DeserializeOwned>(
		&self,
		tool: &'static str,
		args: &[&str],
	) -> Result<Option<T>, HookToolError> {
		match self.run_tool(tool, args).await? {
			None => Ok(None),
			Some(text) => {
				serde_json::from_str::<Option<T>>(&text).map_err(|source| HookToolError::Json {
					tool,
					source,
				})
			}
		}
	}
}

impl Default for CommandHookTools {
	fn default() -> Self {
		Self::new()
	}
}

fn format_setting(key: &str, value: &str) -> String {
	format!("{key}={value}")
}

fn port_spec(port: u16, protocol: Protocol) -> String {
	format!("{port}/{protocol}")
}

#[async_trait]
impl HookTools for CommandHookTools {
	async fn relation_ids(
		&self,
		relation_name: Option<&str>,
	) -> Result<Option<Vec<String>>, HookToolError> {
		let mut args = vec!["--format=json"];
		if let Some(name) = relation_name {
			args.push(name);
		}
		self.run_json_tool(RELATION_IDS, &args).await
	}

	async fn relation_list(
		&self,
		relation_id: Option<&str>,
	) -> Result<Option<Vec<String>>, HookToolError> {
		let mut args = vec!["--format=json"];
		if let Some(id) = relation_id {
			args.push("-r");
			args.push(id);
		}
		self.run_json_tool(RELATION_LIST, &args).await
	}

	async fn relation_get(
		&self,
		unit: Option<&str>,
		relation_id: Option<&str>,
	) -> Result<Option<SettingsMap>, HookToolError> {
		let mut args = vec!["--format=json"];
		if let Some(id) = relation_id {
			args.push("-r");
			args.push(id);
		}
		// `-` asks for the full settings bag rather than one attribute.
		args.push("-");
		if let Some(unit) = unit {
			args.push(unit);
		}
		self.run_json_tool(RELATION_GET, &args).await
	}

	async fn relation_attr(
		&self,
		attribute: &str,
		unit: Option<&str>,
		relation_id: Option<&str>,
	) -> Result<Option<String>, HookToolError> {
		let mut args = Vec::new();
		if let Some(id) = relation_id {
			args.push("-r");
			args.push(id);
		}
		args.push(attribute);
		if let Some(unit) = unit {
			args.push(unit);
		}
		self.run_tool(RELATION_GET, &args).await
	}

	async fn relation_set(
		&self,
		settings: &[(String, String)],
		relation_id: Option<&str>,
	) -> Result<(), HookToolError> {
		let pairs: Vec<String> = settings
			.iter()
			.map(|(key, value)| format_setting(key, value))
			.collect();

		let mut args: Vec<&str> = pairs.iter().map(String::as_str).collect();
		if let Some(id) = relation_id {
			args.push("-r");
			args.push(id);
		}

		self.run_tool(RELATION_SET, &args).await?;
		Ok(())
	}

	async fn config_get(&self) -> Result<Option<SettingsMap>, HookToolError> {
		self.run_json_tool(CONFIG_GET, &["--format=json"]).await
	}

	async fn config_attr(&self, key: &str) -> Result<Option<String>, HookToolError> {
		self.run_tool(CONFIG_GET, &[key]).await
	}

	async fn unit_get(&self, key: &str) -> Result<Option<String>, HookToolError> {
		self.run_tool(UNIT_GET, &[key]).await
	}

	async fn juju_log(&self, message: &str) -> Result<(), HookToolError> {
		// `--` keeps messages that start with a dash from being eaten as
		// flags.
		self.run_tool(JUJU_LOG, &["--", message]).await?;
		Ok(())
	}

	async fn open_port(&self, port: u16, protocol: Protocol) -> Result<(), HookToolError> {
		let spec = port_spec(port, protocol);
		self.run_tool(OPEN_PORT, &[&spec]).await?;
		Ok(())
	}

	async fn close_port(&self, port: u16, protocol: Protocol) -> Result<(), HookToolError> {
		let spec = port_spec(port, protocol);
		self.run_tool(CLOSE_PORT, &[&spec]).await?;
		Ok(())
	}
}
