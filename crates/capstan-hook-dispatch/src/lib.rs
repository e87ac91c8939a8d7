// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Hook registry and dispatch for compiled charms.
//!
//! A Rust charm ships one binary, symlinked under `hooks/` once per hook
//! name (`hooks/install`, `hooks/config-changed`, ...). Juju executes the
//! symlink; the binary registers a handler per hook and dispatches on the
//! name it was invoked as. Entry, exit and failures are reported to the
//! Juju debug log.

pub mod dispatch;
pub mod error;
pub mod registry;

pub use dispatch::{dispatch, run_hook};
pub use error::DispatchError;
pub use registry::{HookHandler, HookRegistry};
