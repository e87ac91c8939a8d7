// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Client for the Juju hook tool CLI contract.
//!
//! Inside a hook, Juju puts a fixed set of tools on the `PATH`:
//! `relation-get`, `relation-set`, `relation-ids`, `relation-list`,
//! `config-get`, `unit-get`, `juju-log`, `open-port` and `close-port`.
//! This crate formats their arguments, spawns them, and decodes their
//! JSON or plain-text output. It deliberately implements nothing of the
//! orchestrator's own semantics; those live behind the tools.
//!
//! The one invariant callers can rely on: a tool that succeeds with empty
//! output means "nothing there", surfaced as `Ok(None)`.

pub mod client;
pub mod command_client;
pub mod error;

pub use client::{HookTools, Protocol, SettingsMap};
pub use command_client::CommandHookTools;
pub use error::HookToolError;
