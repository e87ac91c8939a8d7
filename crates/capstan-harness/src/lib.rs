// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Deployment test harness for charms.
//!
//! Functional charm tests drive a real Juju environment: deploy, relate,
//! then poll `juju status` until machines, units and relations settle.
//! This crate models the status document, answers point queries against
//! it, and provides the waiters those tests are built from, plus the
//! temp-file plumbing for `juju deploy --config`.

pub mod config_file;
pub mod error;
pub mod status;
pub mod wait;

pub use config_file::make_charm_config_file;
pub use error::HarnessError;
pub use status::{JujuCli, Machine, RelationState, Service, Status, StatusSource, Unit};
pub use wait::{
	wait_for_machine, wait_for_page, wait_for_page_contents, wait_for_relation, wait_for_unit,
};
