//! Query surface for Cohort: stage status aggregation, filtering, and the
//! read-only document accessors.
//!
//! Every operation here is a pure function of (dataset root, on-disk state,
//! request parameters). Nothing is cached between calls; each query reads
//! what exists now.

pub mod error;
pub mod query;
pub mod raw;
pub mod status;

pub use error::QueryError;
pub use query::{
    dataset_info, navigate, participants_sessions, pipeline_details, DataStage, DatasetInfo,
    NavigationResult, PipelineDetail, PipelineSelector, StageSummary, StatusReport,
};
pub use raw::{
    list_directory, read_config_document, read_dataset_file, read_manifest_table,
    read_pipeline_document, DirectoryEntry, DirectoryListing, FileContent, ManifestTable,
    PipelineDocKind, PipelineDocument,
};
pub use status::{aggregate, StatusRecord};
