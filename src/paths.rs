// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Build-root resolution and root-relative module ids
//!
//! Root-relative ids are what stabilize any hash the external transform
//! engine derives from "filename": the same source at the same relative
//! position produces identical output regardless of which machine or
//! absolute path performed the build.

use crate::error::Result;
use std::path::{Path, PathBuf};

/// Resolve the build's working directory to an absolute canonical path
///
/// Uses the explicitly configured directory if set, otherwise the process's
/// current directory.
pub fn root_dir(configured: Option<&Path>) -> Result<PathBuf> {
    let dir = match configured {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir()?,
    };
    Ok(dir.canonicalize()?)
}

/// Convert a path to a root-relative module id
///
/// Already-relative paths pass through, gaining a leading `./` when they do
/// not start with a current-directory marker. Absolute paths are rewritten
/// relative to `build_root`. Separators are always normalized to `/` so the
/// same id string is produced under any host OS.
pub fn relative_id(build_root: &Path, target: &Path) -> String {
    if target.is_relative() {
        let id = normalize_separators(&target.to_string_lossy());
        if id.starts_with('.') {
            return id;
        }
        return format!("./{}", id);
    }

    let diff = pathdiff::diff_paths(target, build_root)
        .unwrap_or_else(|| target.to_path_buf());
    let id = normalize_separators(&diff.to_string_lossy());
    if id.starts_with('.') {
        id
    } else {
        format!("./{}", id)
    }
}

/// Join a root-relative id back onto the build root, yielding an absolute path
///
/// Absolute inputs pass through untouched.
pub fn absolute_from_id(build_root: &Path, id: &str) -> PathBuf {
    let path = Path::new(id);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    // Drop the leading marker so the joined path has no `.` components
    build_root.join(id.strip_prefix("./").unwrap_or(id))
}

/// Rewrite path separators to the pipeline's canonical `/`
fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}
