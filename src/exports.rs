// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Flattening of the engine's per-class export records
//!
//! Transform engines are free to emit export keys in any internal order;
//! sorting here is the only guarantee of deterministic, diff-stable
//! generated JS across rebuilds and machines.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A class composed into another via `composes`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposeRef {
    /// Generated scoped name of the composed class
    pub name: String,
}

/// Per-class export record produced by the external transform engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CssExport {
    /// Generated scoped name for the class
    pub name: String,
    /// Composed classes, in their original order
    #[serde(default)]
    pub composes: Vec<ComposeRef>,
}

/// Flat mapping from original class name to its space-joined generated names
///
/// Iteration order is always lexicographic by original class name, so two
/// builds of identical input produce byte-identical JS output.
pub type ExportMapping = BTreeMap<String, String>;

/// Flatten an engine export table into an [`ExportMapping`]
///
/// Keys are visited in sorted order, not the engine's emission order. Each
/// value is the generated name followed by the generated names of all
/// composed entries, space-joined, when any exist.
pub fn normalize_exports(exports: &HashMap<String, CssExport>) -> ExportMapping {
    let mut mapping = ExportMapping::new();
    for (original, export) in exports {
        let mut value = export.name.clone();
        for composed in &export.composes {
            value.push(' ');
            value.push_str(&composed.name);
        }
        mapping.insert(original.clone(), value);
    }
    mapping
}

#[cfg(test)]
mod tests {
    use super::*;

    fn export(name: &str, composes: &[&str]) -> CssExport {
        CssExport {
            name: name.to_string(),
            composes: composes
                .iter()
                .map(|c| ComposeRef {
                    name: c.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_keys_sorted_independent_of_emission_order() {
        // Emission order: btn, Alert, zzz
        let mut table = HashMap::new();
        table.insert("btn".to_string(), export("btn_1a2b", &[]));
        table.insert("Alert".to_string(), export("Alert_3c4d", &[]));
        table.insert("zzz".to_string(), export("zzz_5e6f", &[]));

        let mapping = normalize_exports(&table);
        let keys: Vec<&String> = mapping.keys().collect();
        assert_eq!(keys, ["Alert", "btn", "zzz"]);
    }

    #[test]
    fn test_compose_flattening() {
        let mut table = HashMap::new();
        table.insert(
            "foo".to_string(),
            export("foo_1a2b", &["bar_3c4d", "baz_5e6f"]),
        );

        let mapping = normalize_exports(&table);
        assert_eq!(mapping["foo"], "foo_1a2b bar_3c4d baz_5e6f");
    }

    #[test]
    fn test_plain_export_has_no_trailing_space() {
        let mut table = HashMap::new();
        table.insert("btn".to_string(), export("btn_1a2b", &[]));

        let mapping = normalize_exports(&table);
        assert_eq!(mapping["btn"], "btn_1a2b");
    }

    #[test]
    fn test_json_serialization_is_key_ordered() {
        let mut table = HashMap::new();
        table.insert("zebra".to_string(), export("zebra_9", &[]));
        table.insert("apple".to_string(), export("apple_1", &[]));

        let mapping = normalize_exports(&table);
        let json = serde_json::to_string(&mapping).unwrap();
        assert_eq!(json, r#"{"apple":"apple_1","zebra":"zebra_9"}"#);
    }
}
