//! Core data model and dataset-tree access for Cohort.
//!
//! A dataset root holds a configuration document, a tabular manifest, and a
//! fixed set of stage directories (sourcedata, organized, bids, derivatives,
//! pipelines). This crate parses the two documents, resolves possibly-partial
//! pipeline coordinates into a concrete identity, and maps logical location
//! descriptors to validated filesystem paths. Everything is read-only and
//! request-scoped; nothing here writes to the dataset or caches across calls.

pub mod config;
pub mod error;
pub mod layout;
pub mod manifest;
pub mod navigate;
pub mod pipeline;

pub use config::{DatasetConfig, PipelineEntry};
pub use error::CoreError;
pub use manifest::{Manifest, ManifestRecord};
pub use navigate::{contained_join, Navigator, PathType};
pub use pipeline::{cmp_versions, resolve_identity, PipelineIdentity};
