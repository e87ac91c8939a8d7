// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::fmt;
use std::path::PathBuf;

use capstan_hook_tools::{CommandHookTools, HookTools};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::ServiceError;

const SERVICE: &str = "service";

/// Actions the `service` command accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServiceAction {
	Start,
	Stop,
	Restart,
	Reload,
}

impl ServiceAction {
	pub fn as_str(&self) -> &'static str {
		match self {
			ServiceAction::Start => "start",
			ServiceAction::Stop => "stop",
			ServiceAction::Restart => "restart",
			ServiceAction::Reload => "reload",
		}
	}
}

impl fmt::Display for ServiceAction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Drives the machine's `service` command on behalf of a charm.
pub struct ServiceRunner {
	bin_dir: Option<PathBuf>,
	tools: CommandHookTools,
}

impl ServiceRunner {
	pub fn new() -> Self {
		Self {
			bin_dir: None,
			tools: CommandHookTools::new(),
		}
	}

	/// Resolve `service` and the hook tools from `dir` instead of the
	/// `PATH`.
	pub fn with_bin_dir(dir: impl Into<PathBuf>) -> Self {
		let dir = dir.into();
		Self {
			tools: CommandHookTools::with_tool_dir(&dir),
			bin_dir: Some(dir),
		}
	}

	/// Perform `action` on `service`.
	///
	/// A failed restart falls back to a plain start: a service that was
	/// never running has nothing to restart. Action failures are reported
	/// through `juju-log` before they propagate.
	pub async fn control(&self, service: &str, action: ServiceAction) -> Result<(), ServiceError> {
		match self.run_service(service, action).await {
			Ok(()) => {
				debug!(service = %service, action = %action, "service action succeeded");
				Ok(())
			}
			Err(ServiceError::ActionFailed { .. }) if action == ServiceAction::Restart => {
				warn!(service = %service, "restart failed; falling back to start");
				match self.run_service(service, ServiceAction::Start).await {
					Ok(()) => Ok(()),
					Err(err) => self.report_failure(service, action, err).await,
				}
			}
			Err(err @ ServiceError::ActionFailed { .. }) => {
				self.report_failure(service, action, err).await
			}
			Err(err) => Err(err),
		}
	}

	pub async fn start(&self, service: &str) -> Result<(), ServiceError> {
		self.control(service, ServiceAction::Start).await
	}

	pub async fn stop(&self, service: &str) -> Result<(), ServiceError> {
		self.control(service, ServiceAction::Stop).await
	}

	pub async fn restart(&self, service: &str) -> Result<(), ServiceError> {
		self.control(service, ServiceAction::Restart).await
	}

	pub async fn reload(&self, service: &str) -> Result<(), ServiceError> {
		self.control(service, ServiceAction::Reload).await
	}

	async fn run_service(&self, service: &str, action: ServiceAction) -> Result<(), ServiceError> {
		let program = match &self.bin_dir {
			Some(dir) => dir.join(SERVICE),
			None => PathBuf::from(SERVICE),
		};

		let mut cmd = Command::new(program);
		cmd.args([service, action.as_str()]);

		let output = cmd.output().await.map_err(|e| {
			if e.kind() == std::io::ErrorKind::NotFound {
				warn!("'service' command not found");
				ServiceError::CommandNotFound
			} else {
				ServiceError::Io(e)
			}
		})?;

		if output.status.success() {
			Ok(())
		} else {
			let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
			Err(ServiceError::ActionFailed {
				service: service.to_string(),
				action,
				stderr,
			})
		}
	}

	async fn report_failure(
		&self,
		service: &str,
		action: ServiceAction,
		err: ServiceError,
	) -> Result<(), ServiceError> {
		let message = format!("Failed to perform {action} on service {service}");
		if let Err(log_err) = self.tools.juju_log(&message).await {
			warn!(error = %log_err, "could not report service failure to juju-log");
		}
		Err(err)
	}
}

impl Default for ServiceRunner {
	fn default() -> Self {
		Self::new()
	}
}
