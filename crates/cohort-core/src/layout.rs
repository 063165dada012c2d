//! Fixed on-disk layout of a dataset root.
//!
//! The layout is a documented convention shared by every dataset this engine
//! reads, so it is encoded as constants rather than parsed from anywhere.

use std::path::{Path, PathBuf};

use crate::error::CoreError;

/// Dataset configuration document, directly under the root.
pub const CONFIG_FILE: &str = "global_config.json";

/// Manifest filename candidates, probed in order.
pub const MANIFEST_CANDIDATES: [&str; 2] = ["manifest.tsv", "manifest.csv"];

/// Raw downloads ("downloaded" stage).
pub const DIR_SOURCEDATA: &str = "sourcedata";
/// Post-reorganization, pre-BIDS layout ("organized" stage).
pub const DIR_ORGANIZED: &str = "organized";
/// BIDS-standardized raw data ("bidsified" stage).
pub const DIR_BIDS: &str = "bids";
/// Pipeline outputs, one subtree per pipeline/version/step.
pub const DIR_DERIVATIVES: &str = "derivatives";
/// Installed pipeline configuration/descriptor pairs.
pub const DIR_PIPELINES: &str = "pipelines";
/// Non-imaging tabular data.
pub const DIR_TABULAR: &str = "tabular";

/// Top-level directories addressable through the navigator.
pub const KNOWN_DIRS: [&str; 6] = [
    DIR_SOURCEDATA,
    DIR_ORGANIZED,
    DIR_BIDS,
    DIR_DERIVATIVES,
    DIR_PIPELINES,
    DIR_TABULAR,
];

/// Environment variable naming the process-wide default dataset root.
pub const DATASET_ROOT_ENV: &str = "COHORT_DATASET_ROOT";

/// Resolve the dataset root for one request: explicit parameter, then the
/// environment default, then the current working directory.
///
/// This runs once per entry point; the result is threaded through as a value
/// so nothing deeper in the engine consults the environment.
pub fn resolve_dataset_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Ok(value) = std::env::var(DATASET_ROOT_ENV) {
        if !value.is_empty() {
            return PathBuf::from(value);
        }
    }
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Require that the dataset root exists and is a directory.
pub fn ensure_root(root: &Path) -> Result<(), CoreError> {
    if root.is_dir() {
        Ok(())
    } else {
        Err(CoreError::DatasetRootNotFound {
            path: root.to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_explicit_root_wins() {
        let root = resolve_dataset_root(Some(Path::new("/data/study")));
        assert_eq!(root, PathBuf::from("/data/study"));
    }

    #[test]
    fn test_ensure_root() {
        let tmp = TempDir::new().unwrap();
        assert!(ensure_root(tmp.path()).is_ok());

        let missing = tmp.path().join("nope");
        let err = ensure_root(&missing).unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }
}
