use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Dataset root not found: {path}")]
    DatasetRootNotFound { path: PathBuf },

    #[error("Manifest not found under {root} (tried manifest.tsv, manifest.csv)")]
    ManifestNotFound { root: PathBuf },

    #[error("Malformed manifest at {path}: {reason}")]
    ManifestMalformed { path: PathBuf, reason: String },

    #[error("Dataset configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Malformed dataset configuration at {path}: {reason}")]
    ConfigMalformed { path: PathBuf, reason: String },

    #[error("No pipelines are installed in this dataset")]
    NoPipelines,

    #[error("Pipeline name is required: {count} distinct pipelines are installed")]
    AmbiguousPipeline { count: usize },

    #[error("Pipeline not found: {name}")]
    PipelineNotFound { name: String },

    #[error("Pipeline version not found: {name} {version}")]
    PipelineVersionNotFound { name: String, version: String },

    #[error("Pipeline step not found: {step} ({name} {version} declares: {available})")]
    PipelineStepNotFound {
        name: String,
        version: String,
        step: String,
        available: String,
    },

    #[error("Invalid path type: {0}")]
    InvalidPathType(String),

    #[error("Invalid directory target: {0}")]
    InvalidDirectory(String),

    #[error("Path type {path_type} requires a pipeline name")]
    MissingPipelineIdentity { path_type: String },

    #[error("Path not found: {path}")]
    PathNotFound { path: PathBuf },

    #[error("Not a file: {path}")]
    NotAFile { path: PathBuf },

    #[error("Path escapes the dataset root: {path}")]
    PathOutsideRoot { path: PathBuf },

    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Classify an IO error against the path it touched.
    pub fn from_io(err: std::io::Error, path: &Path) -> Self {
        if err.kind() == std::io::ErrorKind::PermissionDenied {
            CoreError::PermissionDenied {
                path: path.to_path_buf(),
            }
        } else {
            CoreError::Io(err)
        }
    }

    /// Stable machine-readable kind, for transports that pair a kind with
    /// the human-readable message.
    pub fn kind(&self) -> &'static str {
        match self {
            CoreError::DatasetRootNotFound { .. }
            | CoreError::ManifestNotFound { .. }
            | CoreError::ConfigNotFound { .. }
            | CoreError::PathNotFound { .. } => "not_found",
            CoreError::ManifestMalformed { .. } | CoreError::ConfigMalformed { .. } => "malformed",
            CoreError::NoPipelines | CoreError::AmbiguousPipeline { .. } => "ambiguous_pipeline",
            CoreError::PipelineNotFound { .. } => "pipeline_not_found",
            CoreError::PipelineVersionNotFound { .. } => "pipeline_version_not_found",
            CoreError::PipelineStepNotFound { .. } => "pipeline_step_not_found",
            CoreError::InvalidPathType(_)
            | CoreError::InvalidDirectory(_)
            | CoreError::MissingPipelineIdentity { .. }
            | CoreError::NotAFile { .. }
            | CoreError::PathOutsideRoot { .. } => "invalid_parameter",
            CoreError::PermissionDenied { .. } => "permission_denied",
            CoreError::Io(_) => "io",
        }
    }
}
