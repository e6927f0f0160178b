// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Plugin configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Build mode, selecting the generated class-name pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    /// Content-hash-only class names (smallest, stable, unreadable)
    Production,
    /// `name_localName_hash` class names for debuggability
    Development,
}

impl BuildMode {
    /// Parse a mode string; anything other than `"production"` is development
    pub fn from_mode_str(mode: &str) -> Self {
        match mode {
            "production" => BuildMode::Production,
            _ => BuildMode::Development,
        }
    }

    /// The class-name pattern fed to the external transform engine
    pub fn class_name_pattern(self) -> &'static str {
        match self {
            BuildMode::Production => "[hash]",
            BuildMode::Development => "[name]_[local]_[hash]",
        }
    }
}

/// Options recognized by the plugin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginOptions {
    /// Build mode (`"production"` or anything else)
    pub mode: BuildMode,
    /// Absolute directory that `~/`-prefixed specifiers resolve against
    pub app_directory: PathBuf,
}

impl PluginOptions {
    /// Create options from a raw mode string and an app directory
    pub fn new(mode: &str, app_directory: impl Into<PathBuf>) -> Self {
        Self {
            mode: BuildMode::from_mode_str(mode),
            app_directory: app_directory.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing() {
        assert_eq!(BuildMode::from_mode_str("production"), BuildMode::Production);
        assert_eq!(BuildMode::from_mode_str("development"), BuildMode::Development);
        assert_eq!(BuildMode::from_mode_str("test"), BuildMode::Development);
        assert_eq!(BuildMode::from_mode_str(""), BuildMode::Development);
    }

    #[test]
    fn test_class_name_pattern() {
        assert_eq!(BuildMode::Production.class_name_pattern(), "[hash]");
        assert_eq!(
            BuildMode::Development.class_name_pattern(),
            "[name]_[local]_[hash]"
        );
    }
}
