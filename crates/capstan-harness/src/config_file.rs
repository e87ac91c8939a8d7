// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::io::Write;

use serde::Serialize;
use tempfile::NamedTempFile;

use crate::error::HarnessError;

/// Write a charm configuration to a YAML temp file for
/// `juju deploy --config`.
///
/// The `NamedTempFile` is returned rather than just its path: the file
/// is deleted when the handle drops, so the caller's scope bounds its
/// lifetime.
pub fn make_charm_config_file<T: Serialize>(config: &T) -> Result<NamedTempFile, HarnessError> {
	let yaml = serde_yaml::to_string(config)?;

	let mut file = NamedTempFile::new()?;
	file.write_all(yaml.as_bytes())?;
	file.flush()?;

	Ok(file)
}
