//! Path navigation: logical location descriptors to concrete paths.
//!
//! The navigator computes single target locations from the fixed layout
//! table plus a resolved pipeline identity. It never traverses the tree;
//! recursive discovery is not its job.

use std::path::{Component, Path, PathBuf};

use crate::config::DatasetConfig;
use crate::error::CoreError;
use crate::layout;
use crate::pipeline::PipelineIdentity;

/// Logical location within a dataset tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathType {
    DatasetRoot,
    /// A named top-level directory; the target name must come from the
    /// fixed layout table.
    Directory,
    PipelineConfig,
    PipelineDescriptor,
    PipelineOutput,
}

impl PathType {
    /// Parse a caller-supplied token. Unknown tokens are an invalid
    /// parameter, reported before any filesystem access.
    pub fn parse(token: &str) -> Result<Self, CoreError> {
        match token {
            "dataset_root" => Ok(Self::DatasetRoot),
            "directory" => Ok(Self::Directory),
            "pipeline_config" => Ok(Self::PipelineConfig),
            "pipeline_descriptor" => Ok(Self::PipelineDescriptor),
            "pipeline_output" => Ok(Self::PipelineOutput),
            other => Err(CoreError::InvalidPathType(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DatasetRoot => "dataset_root",
            Self::Directory => "directory",
            Self::PipelineConfig => "pipeline_config",
            Self::PipelineDescriptor => "pipeline_descriptor",
            Self::PipelineOutput => "pipeline_output",
        }
    }

    /// Whether this location is scoped to a pipeline identity.
    pub fn is_pipeline_scoped(&self) -> bool {
        matches!(
            self,
            Self::PipelineConfig | Self::PipelineDescriptor | Self::PipelineOutput
        )
    }
}

/// Computes single target locations under one dataset root.
#[derive(Debug)]
pub struct Navigator<'a> {
    root: &'a Path,
    config: &'a DatasetConfig,
}

impl<'a> Navigator<'a> {
    pub fn new(root: &'a Path, config: &'a DatasetConfig) -> Self {
        Self { root, config }
    }

    pub fn root(&self) -> &Path {
        self.root
    }

    /// The intended location for a logical descriptor. The path may not
    /// exist yet; existence-check callers want exactly that.
    pub fn resolve(
        &self,
        path_type: PathType,
        target: Option<&str>,
        identity: Option<&PipelineIdentity>,
    ) -> Result<PathBuf, CoreError> {
        let path = match path_type {
            PathType::DatasetRoot => self.root.to_path_buf(),
            PathType::Directory => {
                let target = target
                    .ok_or_else(|| CoreError::InvalidDirectory("(missing target)".to_string()))?;
                if !layout::KNOWN_DIRS.contains(&target) {
                    return Err(CoreError::InvalidDirectory(target.to_string()));
                }
                self.root.join(target)
            }
            PathType::PipelineConfig => self.pipeline_file(path_type, identity, |e| &e.config_file)?,
            PathType::PipelineDescriptor => {
                self.pipeline_file(path_type, identity, |e| &e.descriptor_file)?
            }
            PathType::PipelineOutput => {
                let id = require_identity(path_type, identity)?;
                self.root
                    .join(layout::DIR_DERIVATIVES)
                    .join(&id.name)
                    .join(&id.version)
                    .join(&id.step)
            }
        };
        self.ensure_contained(path)
    }

    /// Like [`Navigator::resolve`], but the location must exist on disk.
    pub fn resolve_existing(
        &self,
        path_type: PathType,
        target: Option<&str>,
        identity: Option<&PipelineIdentity>,
    ) -> Result<PathBuf, CoreError> {
        let path = self.resolve(path_type, target, identity)?;
        if !path.exists() {
            return Err(CoreError::PathNotFound { path });
        }
        Ok(path)
    }

    /// Expected location of one participant-session under a stage directory.
    /// Session-less pairs omit the session component.
    pub fn pair_dir(&self, stage_dir: &str, participant_id: &str, session_id: &str) -> PathBuf {
        let mut path = self.root.join(stage_dir).join(participant_id);
        if !session_id.is_empty() {
            path.push(session_id);
        }
        path
    }

    /// Expected processed-output location of one participant-session under
    /// a resolved identity's derivatives path.
    pub fn processed_pair_dir(
        &self,
        identity: &PipelineIdentity,
        participant_id: &str,
        session_id: &str,
    ) -> PathBuf {
        let mut path = self
            .root
            .join(layout::DIR_DERIVATIVES)
            .join(&identity.name)
            .join(&identity.version)
            .join(&identity.step)
            .join(participant_id);
        if !session_id.is_empty() {
            path.push(session_id);
        }
        path
    }

    fn pipeline_file(
        &self,
        path_type: PathType,
        identity: Option<&PipelineIdentity>,
        file_of: impl Fn(&crate::config::PipelineEntry) -> &String,
    ) -> Result<PathBuf, CoreError> {
        let id = require_identity(path_type, identity)?;
        let entry = self.config.entry(&id.name, &id.version).ok_or_else(|| {
            CoreError::PipelineVersionNotFound {
                name: id.name.clone(),
                version: id.version.clone(),
            }
        })?;
        Ok(self
            .root
            .join(layout::DIR_PIPELINES)
            .join(entry.dir_name())
            .join(file_of(entry)))
    }

    /// Reject locations that lexically escape the dataset root. All inputs
    /// beyond the fixed table come from configuration strings, so a `..`
    /// smuggled into an entry must not reach the filesystem.
    fn ensure_contained(&self, path: PathBuf) -> Result<PathBuf, CoreError> {
        contained(self.root, path)
    }
}

/// Join a caller-supplied relative path onto the root, rejecting lexical
/// escapes. Absolute inputs replace the root on `join` and fail the
/// containment check like any other escape.
pub fn contained_join(root: &Path, relative: &str) -> Result<PathBuf, CoreError> {
    contained(root, root.join(relative))
}

fn contained(root: &Path, path: PathBuf) -> Result<PathBuf, CoreError> {
    if normalize(&path).starts_with(normalize(root)) {
        Ok(path)
    } else {
        Err(CoreError::PathOutsideRoot { path })
    }
}

fn require_identity<'i>(
    path_type: PathType,
    identity: Option<&'i PipelineIdentity>,
) -> Result<&'i PipelineIdentity, CoreError> {
    identity.ok_or_else(|| CoreError::MissingPipelineIdentity {
        path_type: path_type.as_str().to_string(),
    })
}

/// Lexical normalization: fold `.` away and let `..` pop the previous
/// component. No filesystem access, so it works for paths that do not
/// exist yet.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}
