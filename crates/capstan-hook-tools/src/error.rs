// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Hook tool error types.

use thiserror::Error;

/// Errors from invoking a Juju hook tool.
#[derive(Debug, Error)]
pub enum HookToolError {
	/// The tool binary was not found. Hook tools only exist on the `PATH`
	/// inside a hook invocation.
	#[error("hook tool '{0}' not found; not running inside a Juju hook?")]
	ToolNotFound(&'static str),

	/// Spawning or waiting on the tool failed.
	#[error("I/O error running hook tool: {0}")]
	Io(#[from] std::io::Error),

	/// The tool exited non-zero.
	#[error("{tool} {args:?} failed: {stderr}")]
	CommandFailed {
		tool: &'static str,
		args: Vec<String>,
		stderr: String,
	},

	/// The tool produced output that is not the JSON it promised.
	#[error("invalid JSON from {tool}: {source}")]
	Json {
		tool: &'static str,
		#[source]
		source: serde_json::Error,
	},
}
