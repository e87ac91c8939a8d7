// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::fmt;

use async_trait::async_trait;

use crate::error::HookToolError;

/// Relation and config settings as decoded from `--format=json` output.
pub type SettingsMap = serde_json::Map<String, serde_json::Value>;

/// Transport protocol for port exposure.
///
/// Juju expects the `<port>/<protocol>` form, e.g. `80/TCP`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Protocol {
	#[default]
	Tcp,
	Udp,
}

impl Protocol {
	pub fn as_str(&self) -> &'static str {
		match self {
			Protocol::Tcp => "TCP",
			Protocol::Udp => "UDP",
		}
	}
}

impl fmt::Display for Protocol {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Trait abstracting the hook tool CLI for testability.
///
/// Methods that shell out to a JSON-producing tool return `Ok(None)` when
/// the tool printed nothing (or JSON `null`): the hook ran outside the
/// context the tool needs, or there is genuinely nothing to report. That
/// emptiness-is-absence rule is the whole error model the tools give us
/// on the success path.
#[async_trait]
pub trait HookTools: Send + Sync {
	/// List relation ids for a relation name, e.g. `["db:0", "db:1"]`.
	///
	/// Without a name, the tool uses the relation of the running hook.
	async fn relation_ids(
		&self,
		relation_name: Option<&str>,
	) -> Result<Option<Vec<String>>, HookToolError>;

	/// List remote units participating in a relation.
	async fn relation_list(
		&self,
		relation_id: Option<&str>,
	) -> Result<Option<Vec<String>>, HookToolError>;

	/// Fetch the full settings bag a remote unit published on a relation.
	///
	/// Without `unit`/`relation_id` the tool resolves both from the hook
	/// environment (`JUJU_REMOTE_UNIT`, `JUJU_RELATION`).
	async fn relation_get(
		&self,
		unit: Option<&str>,
		relation_id: Option<&str>,
	) -> Result<Option<SettingsMap>, HookToolError>;

	/// Fetch a single relation attribute as plain text.
	async fn relation_attr(
		&self,
		attribute: &str,
		unit: Option<&str>,
		relation_id: Option<&str>,
	) -> Result<Option<String>, HookToolError>;

	/// Publish settings on a relation. Pairs are passed in order as
	/// `key=value` arguments.
	async fn relation_set(
		&self,
		settings: &[(String, String)],
		relation_id: Option<&str>,
	) -> Result<(), HookToolError>;

	/// Fetch the full charm configuration.
	async fn config_get(&self) -> Result<Option<SettingsMap>, HookToolError>;

	/// Fetch a single configuration value as plain text.
	async fn config_attr(&self, key: &str) -> Result<Option<String>, HookToolError>;

	/// Query unit-local data, e.g. `public-address` or `private-address`.
	async fn unit_get(&self, key: &str) -> Result<Option<String>, HookToolError>;

	/// Send a message to the Juju debug log.
	async fn juju_log(&self, message: &str) -> Result<(), HookToolError>;

	/// Ask the orchestrator to expose a port on this unit.
	async fn open_port(&self, port: u16, protocol: Protocol) -> Result<(), HookToolError>;

	/// Ask the orchestrator to close a previously opened port.
	async fn close_port(&self, port: u16, protocol: Protocol) -> Result<(), HookToolError>;

	/// Log entry into the running hook.
	async fn log_entry(&self) -> Result<(), HookToolError> {
		let hook = hook_name_or_unknown();
		self.juju_log(&format!("--> Entering {hook}")).await
	}

	/// Log exit from the running hook.
	async fn log_exit(&self) -> Result<(), HookToolError> {
		let hook = hook_name_or_unknown();
		self.juju_log(&format!("<-- Exiting {hook}")).await
	}
}

fn hook_name_or_unknown() -> String {
	capstan_hook_env::hook_name().unwrap_or_else(|| "unknown".to_string())
}
