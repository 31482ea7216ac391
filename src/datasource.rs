// CLASSIFICATION: COMMUNITY
// Filename: datasource.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Datasource extraction from cloud-config documents.
//!
//! Only three keys are looked at: `datasource`, `reporting` and
//! `datasource_list`. Everything else in the document is ignored, including
//! the contents of the per-datasource blocks; only their names matter here.
//! Names are upper-cased because cloud-init treats `maas` and `MAAS` alike.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::de::IgnoredAny;
use serde::Deserialize;

use crate::error::{CloudInitError, Result};

#[derive(Debug, Default, Deserialize)]
struct FilteredCloudConfig {
    #[serde(default)]
    datasource: Option<BTreeMap<String, Option<IgnoredAny>>>,
    #[serde(default)]
    reporting: Option<BTreeMap<String, Option<IgnoredAny>>>,
    // `None` when the key is absent or null, `Some(vec![])` for an explicit
    // empty list, which forbids every datasource.
    #[serde(default)]
    datasource_list: Option<Vec<String>>,
}

/// Datasources referenced by a single cloud-config document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasourceSet {
    /// Value of `datasource_list`, upper-cased, sorted and deduplicated.
    /// `None` when the list was not given.
    pub explicitly_allowed: Option<Vec<String>>,
    /// `datasource_list` was present and empty.
    pub explicitly_none_allowed: bool,
    /// Every datasource named anywhere we look, upper-cased and sorted.
    pub mentioned: Vec<String>,
}

/// Read `path` and report the datasources it references.
pub fn extract_datasources(path: &Path) -> Result<DatasourceSet> {
    let text = fs::read_to_string(path)
        .map_err(|e| CloudInitError::io(format!("cannot read {}", path.display()), e))?;
    parse(&text).map_err(|e| CloudInitError::yaml(path, e))
}

/// Same as [`extract_datasources`] for a document already in memory.
pub fn extract_datasources_from_str(text: &str) -> Result<DatasourceSet> {
    parse(text).map_err(|e| CloudInitError::yaml(Path::new("<memory>"), e))
}

fn parse(text: &str) -> std::result::Result<DatasourceSet, serde_yaml::Error> {
    // only the first document of a multi-document stream counts
    let Some(first) = serde_yaml::Deserializer::from_str(text).next() else {
        return Ok(DatasourceSet::default());
    };
    let value = serde_yaml::Value::deserialize(first)?;
    if value.is_null() {
        // empty or comment-only document
        return Ok(DatasourceSet::default());
    }
    let cfg: FilteredCloudConfig = serde_yaml::from_value(value)?;
    Ok(collect(cfg))
}

fn collect(cfg: FilteredCloudConfig) -> DatasourceSet {
    let mut mentioned = BTreeSet::new();
    mentioned.extend(cfg.datasource.into_iter().flat_map(|m| m.into_keys()).map(normalize));
    mentioned.extend(cfg.reporting.into_iter().flat_map(|m| m.into_keys()).map(normalize));

    let mut res = DatasourceSet::default();
    if let Some(list) = cfg.datasource_list {
        if list.is_empty() {
            res.explicitly_none_allowed = true;
            res.explicitly_allowed = Some(Vec::new());
        } else {
            let allowed: BTreeSet<String> = list.into_iter().map(normalize).collect();
            mentioned.extend(allowed.iter().cloned());
            res.explicitly_allowed = Some(allowed.into_iter().collect());
        }
    }
    res.mentioned = mentioned.into_iter().collect();
    res
}

fn normalize(name: String) -> String {
    name.to_uppercase()
}
