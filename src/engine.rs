// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Contract with the external CSS transform engine
//!
//! The engine that actually parses and scopes CSS is an opaque collaborator:
//! it takes source text plus a specifier resolver and returns generated code,
//! a class-name export table, and an optional source map. This module defines
//! that seam; it performs no CSS work itself.

use crate::error::Result;
use crate::exports::CssExport;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Resolves import specifiers encountered inside CSS sources
pub trait SpecifierResolver: Send + Sync {
    /// Resolve `specifier` as imported from the file at `from`
    fn resolve(&self, specifier: &str, from: &Path) -> Result<PathBuf>;
}

/// Specifier resolver with a `~/` app-root alias
///
/// `~/`-prefixed specifiers are rewritten against the configured app
/// directory regardless of the importer's own location; everything else
/// resolves relative to the importing file's directory.
pub struct AppRootResolver {
    app_directory: PathBuf,
}

impl AppRootResolver {
    /// Create a resolver aliasing `~/` to `app_directory`
    pub fn new(app_directory: impl Into<PathBuf>) -> Self {
        Self {
            app_directory: app_directory.into(),
        }
    }
}

impl SpecifierResolver for AppRootResolver {
    fn resolve(&self, specifier: &str, from: &Path) -> Result<PathBuf> {
        if let Some(rest) = specifier.strip_prefix("~/") {
            return Ok(self.app_directory.join(rest));
        }
        let from_dir = from.parent().unwrap_or(Path::new("."));
        Ok(from_dir.join(specifier))
    }
}

/// Input to one transform engine invocation
pub struct TransformInput<'a> {
    /// Root-relative id of the source file (stabilizes engine-derived hashes)
    pub filename: &'a str,
    /// Full source text of the file
    pub source: &'a str,
    /// Class-name generation pattern
    pub pattern: &'a str,
    /// Resolver for specifiers encountered inside the CSS
    pub resolver: &'a dyn SpecifierResolver,
}

/// Output of one transform engine invocation
pub struct TransformOutput {
    /// Generated CSS with scoped class names
    pub code: Vec<u8>,
    /// Export table mapping original class names to generated records
    pub exports: HashMap<String, CssExport>,
    /// Source map bytes, when the engine produced one
    pub source_map: Option<Vec<u8>>,
}

/// The external CSS transform engine
#[async_trait]
pub trait CssTransformer: Send + Sync {
    /// Transform one CSS Modules source into scoped CSS plus an export table
    async fn transform(&self, input: TransformInput<'_>) -> Result<TransformOutput>;
}
