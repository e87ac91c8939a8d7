// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Service control error types.

use thiserror::Error;

use crate::control::ServiceAction;

/// Errors from driving the `service` command.
#[derive(Debug, Error)]
pub enum ServiceError {
	/// The `service` command is not installed.
	#[error("'service' command not found")]
	CommandNotFound,

	/// Spawning or waiting on the command failed.
	#[error("I/O error running service command: {0}")]
	Io(#[from] std::io::Error),

	/// The action exited non-zero.
	#[error("failed to {action} service '{service}': {stderr}")]
	ActionFailed {
		service: String,
		action: ServiceAction,
		stderr: String,
	},
}
