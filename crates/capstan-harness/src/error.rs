// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Harness error types.

use std::time::Duration;

use thiserror::Error;

/// Errors from querying or waiting on a Juju deployment.
#[derive(Debug, Error)]
pub enum HarnessError {
	/// The `juju` binary was not found.
	#[error("'juju' not found in PATH")]
	JujuNotInstalled,

	/// Spawning or waiting on `juju` failed.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// `juju` exited non-zero.
	#[error("juju {args:?} failed: {stderr}")]
	CommandFailed { args: Vec<String>, stderr: String },

	/// The status document did not parse.
	#[error("invalid status YAML: {0}")]
	Yaml(#[from] serde_yaml::Error),

	/// An HTTP poll failed in a way retries cannot fix.
	#[error("HTTP error: {0}")]
	Http(#[from] reqwest::Error),

	/// A waiter ran out of time.
	#[error("timed out after {timeout:?} waiting for {waiting_for}")]
	Timeout {
		waiting_for: String,
		timeout: Duration,
	},

	/// A unit agent entered an error state while being awaited.
	#[error("unit of service '{service}' did not start, agent-state: {state}")]
	UnitError { service: String, state: String },
}
