//! Dataset configuration parsing.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::layout;

/// Dataset-level configuration parsed from `global_config.json`.
///
/// Key names follow the document's uppercase convention.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatasetConfig {
    #[serde(rename = "DATASET_NAME")]
    pub name: String,
    #[serde(rename = "DATASET_DESCRIPTION", default)]
    pub description: String,
    #[serde(rename = "VERSION", default)]
    pub version: String,
    #[serde(rename = "PROC_PIPELINES", default)]
    pub pipelines: Vec<PipelineEntry>,
}

/// One installed pipeline at one version. `(name, version)` is unique within
/// a configuration; a name may appear at several versions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineEntry {
    #[serde(rename = "NAME")]
    pub name: String,
    #[serde(rename = "VERSION")]
    pub version: String,
    /// Ordered processing steps. Defaults to a single "default" step so
    /// step defaulting always has a first step to pick.
    #[serde(rename = "STEPS", default = "default_steps")]
    pub steps: Vec<String>,
    #[serde(rename = "CONFIG_FILE", default = "default_config_file")]
    pub config_file: String,
    #[serde(rename = "DESCRIPTOR_FILE", default = "default_descriptor_file")]
    pub descriptor_file: String,
}

fn default_steps() -> Vec<String> {
    vec!["default".to_string()]
}

fn default_config_file() -> String {
    "config.json".to_string()
}

fn default_descriptor_file() -> String {
    "descriptor.json".to_string()
}

impl DatasetConfig {
    /// The configuration file location under a dataset root.
    pub fn path_under(root: &Path) -> PathBuf {
        root.join(layout::CONFIG_FILE)
    }

    /// Load and validate the configuration for a dataset root.
    ///
    /// Absence is a hard error: a directory without `global_config.json` is
    /// not a dataset, not a degraded one.
    pub fn load(root: &Path) -> Result<Self, CoreError> {
        let path = Self::path_under(root);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CoreError::ConfigNotFound { path });
            }
            Err(e) => return Err(CoreError::from_io(e, &path)),
        };
        let mut config: Self =
            serde_json::from_slice(&bytes).map_err(|e| CoreError::ConfigMalformed {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        for entry in &mut config.pipelines {
            if entry.steps.is_empty() {
                entry.steps = default_steps();
            }
        }
        tracing::debug!(
            dataset = %config.name,
            pipelines = config.pipelines.len(),
            "loaded dataset configuration"
        );
        Ok(config)
    }

    /// All entries matching a pipeline name, in configuration order.
    pub fn versions_of<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a PipelineEntry> {
        self.pipelines.iter().filter(move |p| p.name == name)
    }

    /// The entry for an exact `(name, version)` pair.
    pub fn entry(&self, name: &str, version: &str) -> Option<&PipelineEntry> {
        self.pipelines
            .iter()
            .find(|p| p.name == name && p.version == version)
    }

    /// Distinct pipeline names, in first-seen configuration order.
    pub fn pipeline_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for p in &self.pipelines {
            if !names.contains(&p.name.as_str()) {
                names.push(&p.name);
            }
        }
        names
    }
}

impl PipelineEntry {
    /// Directory name under `pipelines/` holding this entry's files.
    pub fn dir_name(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }
}
