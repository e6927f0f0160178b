// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Host build-system plugin protocol
//!
//! The host drives the pipeline through onResolve/onLoad style hooks keyed
//! by a path filter and a namespace. These are the request and result types
//! exchanged across that boundary, plus the typed data carrier threaded
//! between phases.

use crate::error::{PluginError, Result};
use crate::exports::CssExport;
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Namespace of ordinary on-disk modules in the host's graph
pub const FILE_NAMESPACE: &str = "file";

/// Namespace of the virtual modules served by this pipeline
pub const PLUGIN_NAMESPACE: &str = "css-modules-plugin";

/// Phase suffix tagging the synthetic JS side of a source file
pub const BUILDING_SUFFIX: &str = "?css-modules-plugin-building";

/// Phase suffix tagging the synthetic CSS side of a source file
pub const BUILT_SUFFIX: &str = "?css-modules-plugin-built";

/// Typed carrier threaded through the virtual-module phases
///
/// Both variants name the same physical source file via its root-relative
/// path; the built variant additionally carries the generated CSS forward to
/// the final load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginData {
    /// Attached when a real source file is tagged for transformation
    Building {
        /// Root-relative id of the source file
        relative_path_to_build_root: String,
    },
    /// Attached once the transform has run
    Built {
        /// Root-relative id of the source file
        relative_path_to_build_root: String,
        /// Generated CSS to replay at the built-phase load
        css: String,
        /// Raw export table from the transform engine
        exports: HashMap<String, CssExport>,
    },
}

impl PluginData {
    /// Root-relative path of the underlying source file
    pub fn relative_path_to_build_root(&self) -> &str {
        match self {
            PluginData::Building {
                relative_path_to_build_root,
            }
            | PluginData::Built {
                relative_path_to_build_root,
                ..
            } => relative_path_to_build_root,
        }
    }
}

/// Arguments to a resolve hook
#[derive(Debug, Clone)]
pub struct OnResolveArgs {
    /// Path being imported (absolute or root-relative)
    pub path: String,
    /// Namespace the importing module lives in
    pub namespace: String,
    /// Directory to resolve relative specifiers against
    pub resolve_dir: Option<PathBuf>,
    /// Phase data forwarded from the importing module
    pub plugin_data: Option<PluginData>,
}

/// Arguments to a load hook
#[derive(Debug, Clone)]
pub struct OnLoadArgs {
    /// Virtual module path, including its phase suffix
    pub path: String,
    /// Namespace the module was resolved into
    pub namespace: String,
    /// Phase data attached at resolution
    pub plugin_data: Option<PluginData>,
}

/// Result of a resolve hook
#[derive(Debug, Clone)]
pub struct ResolveOutcome {
    /// Resolved module path
    pub path: String,
    /// Namespace the module is placed in
    pub namespace: String,
    /// Whether the module is external to the bundle
    pub external: bool,
    /// Whether the module must survive tree-shaking
    pub side_effects: bool,
    /// Phase data carried to the module's load
    pub plugin_data: Option<PluginData>,
}

impl ResolveOutcome {
    /// A non-external virtual module in the plugin namespace
    ///
    /// Marked as having side effects so the host does not tree-shake it
    /// away.
    pub fn virtual_module(path: String, plugin_data: PluginData) -> Self {
        Self {
            path,
            namespace: PLUGIN_NAMESPACE.to_string(),
            external: false,
            side_effects: true,
            plugin_data: Some(plugin_data),
        }
    }
}

/// Content loader the host should apply to loaded contents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Loader {
    /// JavaScript contents
    Js,
    /// CSS contents
    Css,
}

/// Result of a load hook
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    /// Loader to parse `contents` with
    pub loader: Loader,
    /// Generated module text
    pub contents: String,
    /// Directory that relative imports inside `contents` resolve against
    pub resolve_dir: Option<PathBuf>,
    /// Phase data forwarded to importers of this module
    pub plugin_data: Option<PluginData>,
}

/// A hook registration key: path filter plus namespace discriminator
#[derive(Debug, Clone)]
pub struct HookFilter {
    /// Regular expression matched against module paths
    pub filter: Regex,
    /// Namespace the hook applies to
    pub namespace: &'static str,
}

impl HookFilter {
    pub(crate) fn new(pattern: &str, namespace: &'static str) -> Self {
        Self {
            filter: Regex::new(pattern).unwrap(),
            namespace,
        }
    }
}

/// The host's own module resolution, delegated to for real files
#[async_trait]
pub trait HostResolver: Send + Sync {
    /// Resolve `path` to a canonical absolute path
    async fn resolve(&self, path: &str, resolve_dir: Option<&Path>) -> Result<PathBuf>;
}

/// Require the built-phase carrier, rejecting anything else
pub(crate) fn expect_built(
    data: Option<&PluginData>,
) -> Result<(&str, &str, &HashMap<String, CssExport>)> {
    match data {
        Some(PluginData::Built {
            relative_path_to_build_root,
            css,
            exports,
        }) => Ok((relative_path_to_build_root, css, exports)),
        _ => Err(PluginError::PhaseData("built")),
    }
}
