// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{trace, warn};

use crate::error::HarnessError;

/// The `juju status` document, reduced to the fields the harness reads.
///
/// Unknown per-unit fields stay available through [`Unit::item`]; the
/// status format grew organically and tests occasionally poke at the
/// long tail.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Status {
	#[serde(default)]
	pub machines: BTreeMap<String, Machine>,
	#[serde(default)]
	pub services: BTreeMap<String, Service>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Machine {
	#[serde(rename = "dns-name", default)]
	pub dns_name: Option<String>,
	#[serde(rename = "instance-id", default)]
	pub instance_id: Option<String>,
	#[serde(rename = "instance-state", default)]
	pub instance_state: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Service {
	#[serde(default)]
	pub charm: Option<String>,
	#[serde(default)]
	pub units: BTreeMap<String, Unit>,
	#[serde(flatten)]
	pub extra: BTreeMap<String, serde_yaml::Value>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Unit {
	#[serde(rename = "agent-state", default)]
	pub agent_state: Option<String>,
	#[serde(rename = "public-address", default)]
	pub public_address: Option<String>,
	#[serde(rename = "open-ports", default)]
	pub open_ports: Vec<String>,
	#[serde(default)]
	pub relations: BTreeMap<String, RelationState>,
	#[serde(flatten)]
	pub extra: BTreeMap<String, serde_yaml::Value>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct RelationState {
	#[serde(default)]
	pub state: Option<String>,
}

impl Status {
	pub fn service(&self, name: &str) -> Option<&Service> {
		self.services.get(name)
	}

	/// Look up a unit of a service.
	///
	/// With no unit name, the lexicographically first unit answers: when
	/// a test does not care which unit it asks, it must at least always
	/// ask the same one. A missing service is `None`, not an error; a
	/// freshly deployed service takes a while to appear in status at all.
	pub fn unit_info(&self, service: &str, unit: Option<&str>) -> Option<(&str, &Unit)> {
		let service = self.services.get(service)?;
		match unit {
			Some(name) => service
				.units
				.get_key_value(name)
				.map(|(name, unit)| (name.as_str(), unit)),
			None => service
				.units
				.iter()
				.next()
				.map(|(name, unit)| (name.as_str(), unit)),
		}
	}

	/// The agent state of a service's unit (first unit if unnamed).
	pub fn agent_state(&self, service: &str, unit: Option<&str>) -> Option<&str> {
		self.unit_info(service, unit)
			.and_then(|(_, unit)| unit.agent_state.as_deref())
	}

	/// The state of a named relation on a service's first unit.
	pub fn relation_state(&self, service: &str, relation: &str) -> Option<&str> {
		self.unit_info(service, None)
			.and_then(|(_, unit)| unit.relations.get(relation))
			.and_then(|relation| relation.state.as_deref())
	}
}

impl Unit {
	/// Generic access to a status item on this unit, typed fields
	/// included.
	pub fn item(&self, name: &str) -> Option<serde_yaml::Value> {
		match name {
			"agent-state" => self.agent_state.clone().map(serde_yaml::Value::String),
			"public-address" => self.public_address.clone().map(serde_yaml::Value::String),
			"open-ports" => serde_yaml::to_value(&self.open_ports).ok(),
			"relations" => serde_yaml::to_value(&self.relations).ok(),
			other => self.extra.get(other).cloned(),
		}
	}
}

/// Source of status documents, abstracted for testability.
#[async_trait]
pub trait StatusSource: Send + Sync {
	async fn status(&self) -> Result<Status, HarnessError>;
}

/// Status source shelling out to the `juju` CLI.
pub struct JujuCli {
	juju_bin: PathBuf,
	environment: Option<String>,
}

impl JujuCli {
	/// Query the default `juju` from the `PATH`, selecting the
	/// environment named by `JUJU_ENV` when set.
	pub fn new() -> Self {
		Self {
			juju_bin: PathBuf::from("juju"),
			environment: capstan_hook_env::environment(),
		}
	}

	/// Query an explicit `juju` binary.
	pub fn with_binary(bin: impl Into<PathBuf>) -> Self {
		Self {
			juju_bin: bin.into(),
			environment: capstan_hook_env::environment(),
		}
	}

	/// Pin the environment passed as `-e`.
	pub fn environment(mut self, name: impl Into<String>) -> Self {
		self.environment = Some(name.into());
		self
	}
}

impl Default for JujuCli {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl StatusSource for JujuCli {
	async fn status(&self) -> Result<Status, HarnessError> {
		let mut args = vec!["status".to_string()];
		if let Some(env) = &self.environment {
			args.push("-e".to_string());
			args.push(env.clone());
		}

		trace!(args = ?args, "running juju status");

		let output = Command::new(&self.juju_bin)
			.args(&args)
			.output()
			.await
			.map_err(|e| {
				if e.kind() == std::io::ErrorKind::NotFound {
					warn!("juju not found in PATH");
					HarnessError::JujuNotInstalled
				} else {
					HarnessError::Io(e)
				}
			})?;

		if !output.status.success() {
			let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
			return Err(HarnessError::CommandFailed { args, stderr });
		}

		let stdout = String::from_utf8_lossy(&output.stdout);
		if stdout.trim().is_empty() {
			return Ok(Status::default());
		}

		Ok(serde_yaml::from_str(&stdout)?)
	}
}
