// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The four-stage virtual-module pipeline
//!
//! One physical `.module.css` file is driven through two synthetic
//! identities: a "building" module that loads as the generated JS, and a
//! "built" module that loads as the generated CSS the JS imports. The
//! phase suffix is the only discriminator the host's module graph needs to
//! keep the two apart.
//!
//! State machine per source file and build pass:
//!
//! `real-file → building(resolve) → building(load) → built(resolve) →
//! built(load) → terminal`

use crate::cache::{TransformCache, TransformResult};
use crate::config::{BuildMode, PluginOptions};
use crate::engine::{AppRootResolver, CssTransformer, TransformInput};
use crate::error::{PluginError, Result};
use crate::exports::normalize_exports;
use crate::host::{
    expect_built, HookFilter, HostResolver, LoadOutcome, Loader, OnLoadArgs, OnResolveArgs,
    PluginData, ResolveOutcome, BUILDING_SUFFIX, BUILT_SUFFIX, FILE_NAMESPACE, PLUGIN_NAMESPACE,
};
use crate::paths;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Per-build state shared by all pipeline handlers
///
/// Created once at plugin setup and destroyed with the build session. Owns
/// the transform cache so tests can swap in a fresh one per build.
pub struct BuildContext {
    build_root: PathBuf,
    app_directory: PathBuf,
    mode: BuildMode,
    watch: bool,
    cache: TransformCache,
}

impl BuildContext {
    /// Create a context for one build invocation
    ///
    /// `working_dir` overrides the process's current directory as the build
    /// root. `watch` enables the transform cache; a one-shot build never
    /// consults it, since there is no second pass to benefit from it.
    pub fn new(options: PluginOptions, working_dir: Option<&Path>, watch: bool) -> Result<Self> {
        Ok(Self {
            build_root: paths::root_dir(working_dir)?,
            app_directory: options.app_directory,
            mode: options.mode,
            watch,
            cache: TransformCache::new(),
        })
    }

    /// Replace the owned cache (for tests and custom probes)
    pub fn with_cache(mut self, cache: TransformCache) -> Self {
        self.cache = cache;
        self
    }

    /// The build's absolute canonical working directory
    pub fn build_root(&self) -> &Path {
        &self.build_root
    }

    /// Absolute directory that `~/` specifiers resolve against
    pub fn app_directory(&self) -> &Path {
        &self.app_directory
    }

    /// Build mode selecting the class-name pattern
    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    /// Whether this build runs in watch/incremental mode
    pub fn watch(&self) -> bool {
        self.watch
    }

    /// The transform cache owned by this build
    pub fn cache(&self) -> &TransformCache {
        &self.cache
    }

    /// Root-relative id for a path, for stable cross-machine naming
    pub fn relative(&self, target: &Path) -> String {
        paths::relative_id(&self.build_root, target)
    }
}

/// Hook registration keys for the four pipeline stages
#[derive(Debug, Clone)]
pub struct PipelineHooks {
    /// onResolve for real `.module.css` files in the file namespace
    pub resolve_source: HookFilter,
    /// onLoad for building-phase virtual modules
    pub load_building: HookFilter,
    /// onResolve for built-phase imports emitted by generated JS
    pub resolve_built: HookFilter,
    /// onLoad for built-phase virtual modules
    pub load_built: HookFilter,
}

/// The resolve/load state machine for CSS Modules sources
pub struct CssModulesPipeline {
    context: BuildContext,
    engine: Arc<dyn CssTransformer>,
    host: Arc<dyn HostResolver>,
}

impl CssModulesPipeline {
    /// Create a pipeline over one build context
    pub fn new(
        context: BuildContext,
        engine: Arc<dyn CssTransformer>,
        host: Arc<dyn HostResolver>,
    ) -> Self {
        Self {
            context,
            engine,
            host,
        }
    }

    /// The build context driving this pipeline
    pub fn context(&self) -> &BuildContext {
        &self.context
    }

    /// Registration keys the host should install the four handlers under
    pub fn hooks() -> PipelineHooks {
        PipelineHooks {
            resolve_source: HookFilter::new(r"\.module\.css$", FILE_NAMESPACE),
            load_building: HookFilter::new(r"\?css-modules-plugin-building$", PLUGIN_NAMESPACE),
            resolve_built: HookFilter::new(r"\?css-modules-plugin-built$", PLUGIN_NAMESPACE),
            load_built: HookFilter::new(r"\?css-modules-plugin-built$", PLUGIN_NAMESPACE),
        }
    }

    /// Stage 1: tag a real `.module.css` file as a building-phase module
    ///
    /// Delegates to the host's own resolution for the canonical absolute
    /// path, then rewrites it as a root-relative id carrying the building
    /// suffix.
    pub async fn resolve_source(&self, args: &OnResolveArgs) -> Result<ResolveOutcome> {
        let absolute = self
            .host
            .resolve(&args.path, args.resolve_dir.as_deref())
            .await?;
        let relative = self.context.relative(&absolute);

        Ok(ResolveOutcome::virtual_module(
            format!("{relative}{BUILDING_SUFFIX}"),
            PluginData::Building {
                relative_path_to_build_root: relative,
            },
        ))
    }

    /// Stage 2: load a building-phase module as generated JS
    ///
    /// Consults the cache only in watch mode; on a miss, runs the external
    /// transform engine and commits the result before returning it.
    pub async fn load_building(&self, args: &OnLoadArgs) -> Result<LoadOutcome> {
        let relative = match args.path.strip_suffix(BUILDING_SUFFIX) {
            Some(relative) => relative,
            None => return Err(PluginError::InvalidVirtualPath(PathBuf::from(&args.path))),
        };
        let absolute = paths::absolute_from_id(&self.context.build_root, relative);

        if self.context.watch {
            if let Some(cached) = self.context.cache.get(&absolute).await? {
                return Ok(self.building_outcome(relative, &cached));
            }
        }

        debug!("Transforming {}", relative);
        let source = tokio::fs::read_to_string(&absolute).await?;
        let resolver = AppRootResolver::new(&self.context.app_directory);
        let output = self
            .engine
            .transform(TransformInput {
                filename: relative,
                source: &source,
                pattern: self.context.mode.class_name_pattern(),
                resolver: &resolver,
            })
            .await?;

        let mapping = normalize_exports(&output.exports);
        let js = generate_js(relative, &serde_json::to_string(&mapping)?)?;
        let mut css = String::from_utf8_lossy(&output.code).into_owned();
        if let Some(source_map) = &output.source_map {
            append_source_map(&mut css, source_map);
        }

        let resolve_dir = absolute
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.context.build_root.clone());
        let result = Arc::new(TransformResult {
            js,
            css,
            exports: output.exports,
            resolve_dir,
        });

        if self.context.watch {
            self.context
                .cache
                .set(absolute, Arc::clone(&result), source);
        }

        Ok(self.building_outcome(relative, &result))
    }

    /// Stage 3: resolve the built-phase import emitted by generated JS
    ///
    /// Reconstructs the virtual path from the carried root-relative id and
    /// forwards the phase data unchanged.
    pub async fn resolve_built(&self, args: &OnResolveArgs) -> Result<ResolveOutcome> {
        let (relative, _, _) = expect_built(args.plugin_data.as_ref())?;
        let path = format!("{relative}{BUILT_SUFFIX}");

        let data = match args.plugin_data.clone() {
            Some(data) => data,
            None => return Err(PluginError::PhaseData("built")),
        };
        Ok(ResolveOutcome::virtual_module(path, data))
    }

    /// Stage 4: load a built-phase module as the stored CSS
    ///
    /// Relative imports inside the generated CSS resolve against the
    /// original file's containing directory.
    pub async fn load_built(&self, args: &OnLoadArgs) -> Result<LoadOutcome> {
        let (relative, css, _) = expect_built(args.plugin_data.as_ref())?;
        let absolute = paths::absolute_from_id(&self.context.build_root, relative);

        Ok(LoadOutcome {
            loader: Loader::Css,
            contents: css.to_string(),
            resolve_dir: absolute.parent().map(Path::to_path_buf),
            plugin_data: None,
        })
    }

    /// Assemble the building-phase load result from a transform
    fn building_outcome(&self, relative: &str, result: &Arc<TransformResult>) -> LoadOutcome {
        LoadOutcome {
            loader: Loader::Js,
            contents: result.js.clone(),
            resolve_dir: Some(result.resolve_dir.clone()),
            plugin_data: Some(PluginData::Built {
                relative_path_to_build_root: relative.to_string(),
                css: result.css.clone(),
                exports: result.exports.clone(),
            }),
        }
    }
}

/// Generate the JS side of a source file
///
/// Imports the source's base name retagged with the built suffix and
/// default-exports the JSON-serialized class mapping.
fn generate_js(relative: &str, mapping_json: &str) -> Result<String> {
    let base_name = Path::new(relative)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| PluginError::InvalidVirtualPath(PathBuf::from(relative)))?;

    Ok(format!(
        "import \"./{base_name}{BUILT_SUFFIX}\";\nexport default {mapping_json};\n"
    ))
}

/// Append a source map as a base64 data-URL comment
fn append_source_map(css: &mut String, source_map: &[u8]) {
    css.push_str("\n/*# sourceMappingURL=data:application/json;base64,");
    css.push_str(&BASE64.encode(source_map));
    css.push_str(" */");
}
