// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Hook dispatch error types.

use thiserror::Error;

/// Errors from dispatching a hook invocation.
#[derive(Debug, Error)]
pub enum DispatchError {
	/// `argv[0]` yielded no usable hook name.
	#[error("could not determine hook name from argv[0]")]
	MissingHookName,

	/// No handler was registered under the invoked name.
	#[error("no handler registered for hook '{hook}' (registered: {registered:?})")]
	UnknownHook {
		hook: String,
		registered: Vec<String>,
	},

	/// The handler itself failed.
	#[error("hook '{hook}' failed: {source}")]
	Handler {
		hook: String,
		#[source]
		source: anyhow::Error,
	},
}
