// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # cssmods
//!
//! A virtual-module pipeline that lets a bundler treat one CSS Modules
//! source file as two synthetic outputs, without writing intermediate files
//! to disk:
//!
//! - a JavaScript module exporting the scoped class-name mapping
//! - a CSS module carrying the scoped rules the JS module imports
//!
//! The actual CSS parsing and scoping is an external collaborator behind
//! the [`CssTransformer`] trait; this crate owns the resolve/load state
//! machine, the deterministic normalization of exported class names, and a
//! content-validated cache that avoids re-running the transform on every
//! watch-mode rebuild.
//!
//! ## Pipeline walk
//!
//! ```rust,ignore
//! use cssmods::{BuildContext, CssModulesPipeline, PluginOptions};
//! use std::sync::Arc;
//!
//! let options = PluginOptions::new("production", "/srv/site/app");
//! let context = BuildContext::new(options, None, /* watch */ true)?;
//! let pipeline = CssModulesPipeline::new(context, engine, host);
//!
//! // Install the four handlers under CssModulesPipeline::hooks(), then per
//! // source file the host drives:
//! let tagged = pipeline.resolve_source(&args).await?;   // building resolve
//! let js = pipeline.load_building(&load_args).await?;   // building load
//! let css_id = pipeline.resolve_built(&built_args).await?; // built resolve
//! let css = pipeline.load_built(&built_load).await?;    // built load
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod exports;
pub mod host;
pub mod paths;
pub mod pipeline;

// Re-exports
pub use cache::{MemoryProbe, TransformCache, TransformResult, MEMORY_PRESSURE_THRESHOLD};
pub use config::{BuildMode, PluginOptions};
pub use engine::{AppRootResolver, CssTransformer, SpecifierResolver, TransformInput, TransformOutput};
pub use error::{PluginError, Result};
pub use exports::{normalize_exports, ComposeRef, CssExport, ExportMapping};
pub use host::{
    HookFilter, HostResolver, LoadOutcome, Loader, OnLoadArgs, OnResolveArgs, PluginData,
    ResolveOutcome, BUILDING_SUFFIX, BUILT_SUFFIX, FILE_NAMESPACE, PLUGIN_NAMESPACE,
};
pub use pipeline::{BuildContext, CssModulesPipeline, PipelineHooks};

/// Version of the cssmods pipeline
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
