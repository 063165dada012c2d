//! Read-only document accessors: the configuration document, the manifest
//! table, and a pipeline's config/descriptor files, returned as close to
//! their on-disk form as callers can use.

use std::fs;
use std::path::Path;

use serde::Serialize;

use cohort_core::config::DatasetConfig;
use cohort_core::error::CoreError;
use cohort_core::layout;
use cohort_core::manifest::Manifest;
use cohort_core::navigate::{contained_join, Navigator, PathType};
use cohort_core::pipeline::PipelineIdentity;

use crate::error::QueryError;
use crate::query::PipelineSelector;

/// Read the raw configuration document as JSON.
pub fn read_config_document(root: &Path) -> Result<serde_json::Value, QueryError> {
    layout::ensure_root(root)?;
    let path = DatasetConfig::path_under(root);
    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(CoreError::ConfigNotFound { path }.into());
        }
        Err(e) => return Err(CoreError::from_io(e, &path).into()),
    };
    let value = serde_json::from_slice(&bytes).map_err(|e| CoreError::ConfigMalformed {
        path,
        reason: e.to_string(),
    })?;
    Ok(value)
}

/// The manifest table text plus truncation metadata.
#[derive(Debug, Clone, Serialize)]
pub struct ManifestTable {
    pub path: String,
    pub content: String,
    pub total_rows: usize,
    pub returned_rows: usize,
    pub truncated: bool,
}

/// Read the manifest table, optionally truncated to `max_rows` data rows.
pub fn read_manifest_table(
    root: &Path,
    max_rows: Option<usize>,
) -> Result<ManifestTable, QueryError> {
    layout::ensure_root(root)?;
    let manifest = Manifest::load(root)?;
    let total_rows = manifest.records.len();
    let (content, truncated) = manifest.raw_rows(max_rows);
    let returned_rows = content.lines().count().saturating_sub(1);
    Ok(ManifestTable {
        path: manifest.path.display().to_string(),
        content,
        total_rows,
        returned_rows,
        truncated,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineDocKind {
    Config,
    Descriptor,
}

impl PipelineDocKind {
    fn path_type(self) -> PathType {
        match self {
            Self::Config => PathType::PipelineConfig,
            Self::Descriptor => PathType::PipelineDescriptor,
        }
    }
}

/// A pipeline document plus the identity and location it was read from.
/// Documents that fail to parse as JSON come back as a JSON string value.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineDocument {
    pub pipeline: PipelineIdentity,
    pub path: String,
    pub document: serde_json::Value,
}

/// Read a pipeline's config or descriptor document. Identity resolution
/// runs first, so an unknown name fails as `PipelineNotFound` rather than
/// as a missing path; a resolved-but-absent file is `PathNotFound`.
pub fn read_pipeline_document(
    root: &Path,
    kind: PipelineDocKind,
    selector: &PipelineSelector,
) -> Result<PipelineDocument, QueryError> {
    layout::ensure_root(root)?;
    let config = DatasetConfig::load(root)?;
    let identity = cohort_core::resolve_identity(
        &config,
        selector.name.as_deref(),
        selector.version.as_deref(),
        selector.step.as_deref(),
    )?;

    let nav = Navigator::new(root, &config);
    let path = nav.resolve_existing(kind.path_type(), None, Some(&identity))?;
    let text = fs::read_to_string(&path).map_err(|e| CoreError::from_io(e, &path))?;
    let document = serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text));

    Ok(PipelineDocument {
        pipeline: identity,
        path: path.display().to_string(),
        document,
    })
}

/// One entry of a directory listing, relative to the dataset root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryEntry {
    pub name: String,
    /// "directory" or "file".
    pub kind: String,
    pub path: String,
}

/// A single-directory listing (no recursion).
#[derive(Debug, Clone, Serialize)]
pub struct DirectoryListing {
    pub directory: String,
    pub subdirectory: String,
    pub entries: Vec<DirectoryEntry>,
    pub count: usize,
}

/// List one directory under the dataset root, directories before files,
/// each group name-sorted. The subdirectory is containment-checked before
/// any filesystem access; an escape is an invalid parameter, not a miss.
pub fn list_directory(
    root: &Path,
    subdirectory: Option<&str>,
) -> Result<DirectoryListing, QueryError> {
    layout::ensure_root(root)?;
    let subdirectory = subdirectory.unwrap_or("");
    let target = contained_join(root, subdirectory)?;
    if !target.is_dir() {
        return Err(CoreError::PathNotFound { path: target }.into());
    }

    let mut entries = Vec::new();
    let iter = fs::read_dir(&target).map_err(|e| CoreError::from_io(e, &target))?;
    for item in iter {
        let item = item.map_err(|e| CoreError::from_io(e, &target))?;
        let name = item.file_name().to_string_lossy().into_owned();
        let kind = if item.path().is_dir() {
            "directory"
        } else {
            "file"
        };
        let path = item
            .path()
            .strip_prefix(root)
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| item.path().display().to_string());
        entries.push(DirectoryEntry {
            name,
            kind: kind.to_string(),
            path,
        });
    }
    entries.sort_by(|a, b| (&a.kind, &a.name).cmp(&(&b.kind, &b.name)));

    Ok(DirectoryListing {
        directory: target.display().to_string(),
        subdirectory: subdirectory.to_string(),
        count: entries.len(),
        entries,
    })
}

/// A file's content plus where it was read from. JSON files parse into a
/// document; anything else (including JSON that fails to parse) comes back
/// as a string value, same convention as [`read_pipeline_document`].
#[derive(Debug, Clone, Serialize)]
pub struct FileContent {
    pub path: String,
    pub full_path: String,
    /// "json" or "text".
    pub kind: String,
    pub content: serde_json::Value,
}

/// Read one file under the dataset root by relative path, with the same
/// containment guard as [`list_directory`].
pub fn read_dataset_file(root: &Path, file_path: &str) -> Result<FileContent, QueryError> {
    layout::ensure_root(root)?;
    let full = contained_join(root, file_path)?;
    if !full.exists() {
        return Err(CoreError::PathNotFound { path: full }.into());
    }
    if !full.is_file() {
        return Err(CoreError::NotAFile { path: full }.into());
    }

    let text = fs::read_to_string(&full).map_err(|e| CoreError::from_io(e, &full))?;
    let (kind, content) = if full.extension().is_some_and(|e| e == "json") {
        match serde_json::from_str(&text) {
            Ok(value) => ("json", value),
            Err(_) => ("text", serde_json::Value::String(text)),
        }
    } else {
        ("text", serde_json::Value::String(text))
    };

    Ok(FileContent {
        path: file_path.to_string(),
        full_path: full.display().to_string(),
        kind: kind.to_string(),
        content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("global_config.json"),
            r#"{
                "DATASET_NAME": "demo",
                "PROC_PIPELINES": [
                    {"NAME": "fmriprep", "VERSION": "23.2.0", "STEPS": ["run"]}
                ]
            }"#,
        )
        .unwrap();
        fs::write(
            tmp.path().join("manifest.tsv"),
            "participant_id\tsession_id\nsub-01\tses-01\nsub-02\tses-01\n",
        )
        .unwrap();
        tmp
    }

    #[test]
    fn test_read_config_document() {
        let tmp = fixture();
        let value = read_config_document(tmp.path()).unwrap();
        assert_eq!(value["DATASET_NAME"], "demo");
    }

    #[test]
    fn test_read_manifest_table_truncation() {
        let tmp = fixture();
        let table = read_manifest_table(tmp.path(), Some(1)).unwrap();
        assert_eq!(table.total_rows, 2);
        assert_eq!(table.returned_rows, 1);
        assert!(table.truncated);

        let full = read_manifest_table(tmp.path(), None).unwrap();
        assert!(!full.truncated);
        assert_eq!(full.returned_rows, 2);
    }

    #[test]
    fn test_read_pipeline_document() {
        let tmp = fixture();
        let dir = tmp.path().join("pipelines/fmriprep-23.2.0");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("config.json"), r#"{"container": "fmriprep.sif"}"#).unwrap();

        let selector = PipelineSelector {
            name: Some("fmriprep".to_string()),
            ..Default::default()
        };
        let doc =
            read_pipeline_document(tmp.path(), PipelineDocKind::Config, &selector).unwrap();
        assert_eq!(doc.pipeline.version, "23.2.0");
        assert_eq!(doc.document["container"], "fmriprep.sif");
    }

    #[test]
    fn test_missing_pipeline_file_is_path_not_found() {
        let tmp = fixture();
        let selector = PipelineSelector {
            name: Some("fmriprep".to_string()),
            ..Default::default()
        };
        let err = read_pipeline_document(tmp.path(), PipelineDocKind::Descriptor, &selector)
            .unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[test]
    fn test_list_directory_sorted_directories_first() {
        let tmp = fixture();
        fs::create_dir_all(tmp.path().join("pipelines/fmriprep-23.2.0")).unwrap();
        fs::write(
            tmp.path().join("pipelines/fmriprep-23.2.0/config.json"),
            "{}",
        )
        .unwrap();

        let listing = list_directory(tmp.path(), None).unwrap();
        assert_eq!(listing.subdirectory, "");
        assert_eq!(listing.count, 3);
        // Directory first, then files by name.
        assert_eq!(listing.entries[0].name, "pipelines");
        assert_eq!(listing.entries[0].kind, "directory");
        assert_eq!(listing.entries[1].name, "global_config.json");
        assert_eq!(listing.entries[2].name, "manifest.tsv");

        let sub = list_directory(tmp.path(), Some("pipelines/fmriprep-23.2.0")).unwrap();
        assert_eq!(sub.count, 1);
        assert_eq!(sub.entries[0].path, "pipelines/fmriprep-23.2.0/config.json");
    }

    #[test]
    fn test_list_directory_rejects_escape_and_missing() {
        let tmp = fixture();
        let err = list_directory(tmp.path(), Some("../outside")).unwrap_err();
        assert_eq!(err.kind(), "invalid_parameter");

        let err = list_directory(tmp.path(), Some("nope")).unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[test]
    fn test_read_dataset_file_json_and_text() {
        let tmp = fixture();
        let doc = read_dataset_file(tmp.path(), "global_config.json").unwrap();
        assert_eq!(doc.kind, "json");
        assert_eq!(doc.content["DATASET_NAME"], "demo");

        let table = read_dataset_file(tmp.path(), "manifest.tsv").unwrap();
        assert_eq!(table.kind, "text");
        assert!(table
            .content
            .as_str()
            .unwrap()
            .starts_with("participant_id"));
    }

    #[test]
    fn test_read_dataset_file_guards() {
        let tmp = fixture();
        let err = read_dataset_file(tmp.path(), "../etc/passwd").unwrap_err();
        assert_eq!(err.kind(), "invalid_parameter");

        let err = read_dataset_file(tmp.path(), "missing.json").unwrap_err();
        assert_eq!(err.kind(), "not_found");

        fs::create_dir_all(tmp.path().join("bids")).unwrap();
        let err = read_dataset_file(tmp.path(), "bids").unwrap_err();
        assert_eq!(err.kind(), "invalid_parameter");
    }

    #[test]
    fn test_non_json_document_returned_as_text() {
        let tmp = fixture();
        let dir = tmp.path().join("pipelines/fmriprep-23.2.0");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("config.json"), "not json at all").unwrap();

        let selector = PipelineSelector {
            name: Some("fmriprep".to_string()),
            ..Default::default()
        };
        let doc =
            read_pipeline_document(tmp.path(), PipelineDocKind::Config, &selector).unwrap();
        assert_eq!(
            doc.document,
            serde_json::Value::String("not json at all".to_string())
        );
    }
}
