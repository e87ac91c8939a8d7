// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::collections::HashMap;

use async_trait::async_trait;
use capstan_hook_env::HookContext;
use capstan_hook_tools::HookTools;

/// One hook implementation, keyed by the Juju hook name it serves.
#[async_trait]
pub trait HookHandler: Send + Sync {
	/// The hook name, e.g. `config-changed`.
	fn name(&self) -> &str;

	/// Run the hook with the captured context and the hook tool client.
	async fn run(&self, ctx: &HookContext, tools: &dyn HookTools) -> anyhow::Result<()>;
}

/// Registry of hook handlers for one charm binary.
pub struct HookRegistry {
	hooks: HashMap<String, Box<dyn HookHandler>>,
}

impl HookRegistry {
	pub fn new() -> Self {
		Self {
			hooks: HashMap::new(),
		}
	}

	pub fn register(&mut self, handler: Box<dyn HookHandler>) {
		let name = handler.name().to_string();
		tracing::debug!(hook = %name, "registering hook handler");
		self.hooks.insert(name, handler);
	}

	pub fn get(&self, name: &str) -> Option<&dyn HookHandler> {
		self.hooks.get(name).map(|h| h.as_ref())
	}

	/// Registered hook names, sorted for stable error messages.
	pub fn names(&self) -> Vec<String> {
		let mut names: Vec<String> = self.hooks.keys().cloned().collect();
		names.sort();
		names
	}
}

impl Default for HookRegistry {
	fn default() -> Self {
		Self::new()
	}
}
