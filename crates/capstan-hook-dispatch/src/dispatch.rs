// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use capstan_hook_env::HookContext;
use capstan_hook_tools::HookTools;
use tracing::warn;

use crate::error::DispatchError;
use crate::registry::HookRegistry;

/// Dispatch the hook this process was invoked as.
///
/// The hook name comes from `argv[0]` (charm binaries are symlinked under
/// `hooks/` once per hook) and the context from the process environment.
pub async fn dispatch(registry: &HookRegistry, tools: &dyn HookTools) -> Result<(), DispatchError> {
	let ctx = HookContext::from_env();
	let hook = ctx
		.hook_name
		.clone()
		.ok_or(DispatchError::MissingHookName)?;

	run_hook(registry, tools, &ctx, &hook).await
}

/// Run a named hook against the registry.
///
/// Entry and exit are reported to the Juju debug log; a handler failure
/// is logged there too before the error propagates to the caller, which
/// decides the process exit code. Logging is best-effort: a hook must not
/// fail because `juju-log` did.
pub async fn run_hook(
	registry: &HookRegistry,
	tools: &dyn HookTools,
	ctx: &HookContext,
	hook: &str,
) -> Result<(), DispatchError> {
	let handler = registry.get(hook).ok_or_else(|| DispatchError::UnknownHook {
		hook: hook.to_string(),
		registered: registry.names(),
	})?;

	log_best_effort(tools, &format!("--> Entering {hook}")).await;

	match handler.run(ctx, tools).await {
		Ok(()) => {
			log_best_effort(tools, &format!("<-- Exiting {hook}")).await;
			Ok(())
		}
		Err(source) => {
			log_best_effort(tools, &format!("Hook {hook} failed: {source}")).await;
			Err(DispatchError::Handler {
				hook: hook.to_string(),
				source,
			})
		}
	}
}

async fn log_best_effort(tools: &dyn HookTools, message: &str) {
	if let Err(err) = tools.juju_log(message).await {
		warn!(error = %err, message = %message, "could not write to juju debug log");
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use capstan_hook_tools::{HookToolError, Protocol, SettingsMap};
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::sync::{Arc, Mutex};

	use crate::registry::HookHandler;

	/// HookTools stand-in that only records juju-log messages.
	#[derive(Default)]
	struct LogTools {
		logged: Mutex<Vec<String>>,
	}

	impl LogTools {
		fn messages(&self) -> Vec<String> {
			self.logged.lock().unwrap().clone()
		}
	}

	#[async_trait]
	impl HookTools for LogTools {
		async fn relation_ids(
			&self,
			_relation_name: Option<&str>,
		) -> Result<Option<Vec<String>>, HookToolError> {
			Ok(None)
		}

		async fn relation_list(
			&self,
			_relation_id: Option<&str>,
		) -> Result<Option<Vec<String>>, HookToolError> {
			Ok(None)
		}

		async fn relation_get(
			&self,
			_unit: Option<&str>,
			_relation_id: Option<&str>,
		) -> Result<Option<SettingsMap>, HookToolError> {
			Ok(None)
		}

		async fn relation_attr(
			&self,
			_attribute: &str,
			_unit: Option<&str>,
			_relation_id: Option<&str>,
		) -> Result<Option<String>, HookToolError> {
			Ok(None)
		}

		async fn relation_set(
			&self,
			_settings: &[(String, String)],
			_relation_id: Option<&str>,
		) -> Result<(), HookToolError> {
			Ok(())
		}

		async fn config_get(&self) -> Result<Option<SettingsMap>, HookToolError> {
			Ok(None)
		}

		async fn config_attr(&self, _key: &str) -> Result<Option<String>, HookToolError> {
			Ok(None)
		}

		async fn unit_get(&self, _key: &str) -> Result<Option<String>, HookToolError> {
			Ok(None)
		}

		async fn juju_log(&self, message: &str) -> Result<(), HookToolError> {
			self.logged.lock().unwrap().push(message.to_string());
			Ok(())
		}

		async fn open_port(&self, _port: u16, _protocol: Protocol) -> Result<(), HookToolError> {
			Ok(())
		}

		async fn close_port(&self, _port: u16, _protocol: Protocol) -> Result<(), HookToolError> {
			Ok(())
		}
	}

	struct CountingHandler {
		name: String,
		runs: Arc<AtomicUsize>,
		fail_with: Option<String>,
	}

	#[async_trait]
	impl HookHandler for CountingHandler {
		fn name(&self) -> &str {
			&self.name
		}

		async fn run(&self, _ctx: &HookContext, _tools: &dyn HookTools) -> anyhow::Result<()> {
			self.runs.fetch_add(1, Ordering::SeqCst);
			match &self.fail_with {
				Some(message) => Err(anyhow::anyhow!("{message}")),
				None => Ok(()),
			}
		}
	}

	fn registry_with(handler: CountingHandler) -> HookRegistry {
		let mut registry = HookRegistry::new();
		registry.register(Box::new(handler));
		registry
	}

	/// Test: a registered hook runs once, bracketed by entry/exit log
	/// lines.
	///
	/// Why this test is important: the entry/exit pair in the Juju debug
	/// log is how operators attribute output to a hook; it must wrap the
	/// handler, not replace it.
	#[tokio::test]
	async fn test_runs_handler_with_entry_exit_logging() {
		let runs = Arc::new(AtomicUsize::new(0));
		let registry = registry_with(CountingHandler {
			name: "config-changed".to_string(),
			runs: Arc::clone(&runs),
			fail_with: None,
		});
		let tools = LogTools::default();
		let ctx = HookContext {
			hook_name: Some("config-changed".to_string()),
			..Default::default()
		};

		run_hook(&registry, &tools, &ctx, "config-changed")
			.await
			.unwrap();

		assert_eq!(runs.load(Ordering::SeqCst), 1);
		assert_eq!(
			tools.messages(),
			["--> Entering config-changed", "<-- Exiting config-changed"]
		);
	}

	/// Test: an unknown hook reports the registered names.
	///
	/// Why this test is important: the usual cause is a hooks/ symlink
	/// for a name nobody registered; the error has to make that obvious
	/// from the log alone.
	#[tokio::test]
	async fn test_unknown_hook() {
		let registry = registry_with(CountingHandler {
			name: "install".to_string(),
			runs: Arc::new(AtomicUsize::new(0)),
			fail_with: None,
		});
		let tools = LogTools::default();
		let ctx = HookContext::default();

		let err = run_hook(&registry, &tools, &ctx, "upgrade-charm")
			.await
			.unwrap_err();

		match err {
			DispatchError::UnknownHook { hook, registered } => {
				assert_eq!(hook, "upgrade-charm");
				assert_eq!(registered, ["install"]);
			}
			other => panic!("expected UnknownHook, got {other:?}"),
		}

		assert!(tools.messages().is_empty(), "nothing should be logged");
	}

	/// Test: handler failures are logged and propagate with the hook
	/// name attached.
	///
	/// Why this test is important: the charm binary turns this error into
	/// its exit code, which is all Juju sees; the debug log entry is the
	/// only diagnostic trail.
	#[tokio::test]
	async fn test_handler_failure_is_logged_and_propagated() {
		let registry = registry_with(CountingHandler {
			name: "start".to_string(),
			runs: Arc::new(AtomicUsize::new(0)),
			fail_with: Some("port already bound".to_string()),
		});
		let tools = LogTools::default();
		let ctx = HookContext::default();

		let err = run_hook(&registry, &tools, &ctx, "start").await.unwrap_err();

		assert!(matches!(
			err,
			DispatchError::Handler { ref hook, .. } if hook == "start"
		));

		let messages = tools.messages();
		assert_eq!(messages[0], "--> Entering start");
		assert_eq!(messages[1], "Hook start failed: port already bound");
		assert!(
			!messages.iter().any(|m| m.starts_with("<-- Exiting")),
			"no exit line after a failure"
		);
	}
}
