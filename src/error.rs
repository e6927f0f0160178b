// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for the CSS Modules pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PluginError>;

/// Errors that can occur while resolving or loading a CSS module
#[derive(Debug, Error)]
pub enum PluginError {
    /// The underlying file could not be located by the host
    #[error("Cannot resolve '{specifier}': {reason}")]
    Resolve {
        /// Module specifier that failed to resolve
        specifier: String,
        /// Reason reported by the resolver
        reason: String,
    },

    /// The external transform engine rejected the source
    #[error("CSS transform failed for '{filename}': {reason}")]
    Transform {
        /// Root-relative filename handed to the engine
        filename: String,
        /// Engine-reported failure
        reason: String,
    },

    /// File system error (source reads, cache freshness reads)
    #[error("File system error: {0}")]
    Fs(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A virtual module path did not carry the expected phase suffix
    #[error("Invalid virtual module path: {0}")]
    InvalidVirtualPath(PathBuf),

    /// A phase handler received data from the wrong phase
    #[error("Missing or mismatched phase data: expected {0}")]
    PhaseData(&'static str),
}

impl PluginError {
    /// Create a resolution error
    pub fn resolve(specifier: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Resolve {
            specifier: specifier.into(),
            reason: reason.into(),
        }
    }

    /// Create a transform error
    pub fn transform(filename: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Transform {
            filename: filename.into(),
            reason: reason.into(),
        }
    }
}
