// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Hook environment context for Juju charm hooks.
//!
//! Juju invokes hook scripts with execution context passed through the
//! process environment. This crate exposes that context: which unit is
//! running, which relation (if any) triggered the hook, which remote unit
//! is on the other end, and which environment the unit was deployed into.

use std::env;
use std::path::Path;

/// Environment variable holding the local unit name, e.g. `wordpress/0`.
pub const UNIT_NAME_VAR: &str = "JUJU_UNIT_NAME";

/// Environment variable holding the relation name for relation hooks.
pub const RELATION_VAR: &str = "JUJU_RELATION";

/// Environment variable holding the remote unit name for relation hooks.
pub const REMOTE_UNIT_VAR: &str = "JUJU_REMOTE_UNIT";

/// Environment variable holding the Juju environment name.
pub const ENV_VAR: &str = "JUJU_ENV";

/// Name of the environment that enables development-only helpers.
pub const DEVELOPMENT_ENV: &str = "development";

fn non_empty_var(name: &str) -> Option<String> {
	env::var(name).ok().filter(|value| !value.is_empty())
}

/// Returns the name of the local unit, e.g. `wordpress/0`.
///
/// `None` outside a hook invocation.
pub fn unit_name() -> Option<String> {
	non_empty_var(UNIT_NAME_VAR)
}

/// Returns the relation name, e.g. `db`.
///
/// Only set inside relation hooks; `None` elsewhere.
pub fn relation_name() -> Option<String> {
	non_empty_var(RELATION_VAR)
}

/// Returns the remote unit on the other end of the relation, e.g.
/// `mysql/1`.
///
/// Only set inside relation hooks; `None` elsewhere.
pub fn remote_unit() -> Option<String> {
	non_empty_var(REMOTE_UNIT_VAR)
}

/// Returns the name of the Juju environment the unit runs in.
pub fn environment() -> Option<String> {
	non_empty_var(ENV_VAR)
}

/// Returns true when the unit runs in the `development` environment.
///
/// Development deployments may interpose extra helpers (stub tools,
/// verbose logging) that must never load in production.
pub fn is_development() -> bool {
	environment().as_deref() == Some(DEVELOPMENT_ENV)
}

/// Returns the name of the running hook, derived from `argv[0]`.
///
/// Juju invokes hooks by executing `hooks/<hook-name>`, so the file name
/// of the current executable is the hook name, e.g. `config-changed`.
pub fn hook_name() -> Option<String> {
	env::args().next().and_then(|argv0| script_name(&argv0))
}

fn script_name(argv0: &str) -> Option<String> {
	Path::new(argv0)
		.file_name()
		.map(|name| name.to_string_lossy().into_owned())
		.filter(|name| !name.is_empty())
}

/// A snapshot of the hook execution context.
///
/// Accessor functions read the environment on every call; code that wants
/// one coherent view of the context captures it once with
/// [`HookContext::from_env`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HookContext {
	/// Local unit name, e.g. `wordpress/0`.
	pub unit_name: Option<String>,
	/// Relation name for relation hooks.
	pub relation_name: Option<String>,
	/// Remote unit name for relation hooks.
	pub remote_unit: Option<String>,
	/// Juju environment name.
	pub environment: Option<String>,
	/// Name of the running hook script.
	pub hook_name: Option<String>,
}

impl HookContext {
	/// Capture the hook context from the process environment.
	pub fn from_env() -> Self {
		let ctx = Self {
			unit_name: unit_name(),
			relation_name: relation_name(),
			remote_unit: remote_unit(),
			environment: environment(),
			hook_name: hook_name(),
		};

		tracing::trace!(
				unit = ?ctx.unit_name,
				relation = ?ctx.relation_name,
				remote_unit = ?ctx.remote_unit,
				hook = ?ctx.hook_name,
				"captured hook context"
		);

		ctx
	}

	/// True when this hook runs inside a relation context.
	pub fn in_relation(&self) -> bool {
		self.relation_name.is_some()
	}

	/// True when the unit runs in the `development` environment.
	pub fn is_development(&self) -> bool {
		self.environment.as_deref() == Some(DEVELOPMENT_ENV)
	}
}
