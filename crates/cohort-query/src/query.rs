//! The query/filter layer: stage selectors, filtered status reports, and
//! the dataset overview.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;

use cohort_core::config::DatasetConfig;
use cohort_core::layout;
use cohort_core::manifest::Manifest;
use cohort_core::navigate::{Navigator, PathType};
use cohort_core::pipeline::{resolve_identity, PipelineIdentity};

use crate::error::QueryError;
use crate::status::{aggregate, StatusRecord};

/// Curation-stage selector for participant-session queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataStage {
    All,
    Imaging,
    Downloaded,
    Organized,
    Bidsified,
    Processed,
}

impl DataStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Imaging => "imaging",
            Self::Downloaded => "downloaded",
            Self::Organized => "organized",
            Self::Bidsified => "bidsified",
            Self::Processed => "processed",
        }
    }
}

impl FromStr for DataStage {
    type Err = QueryError;

    /// Parses a selector token. Rejection happens here, before any
    /// filesystem access.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "imaging" => Ok(Self::Imaging),
            "downloaded" => Ok(Self::Downloaded),
            "organized" => Ok(Self::Organized),
            "bidsified" => Ok(Self::Bidsified),
            "processed" => Ok(Self::Processed),
            other => Err(QueryError::InvalidDataStage(other.to_string())),
        }
    }
}

impl fmt::Display for DataStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied pipeline coordinates, pre-resolution.
#[derive(Debug, Clone, Default)]
pub struct PipelineSelector {
    pub name: Option<String>,
    pub version: Option<String>,
    pub step: Option<String>,
}

impl PipelineSelector {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.version.is_none() && self.step.is_none()
    }

    fn resolve(&self, config: &DatasetConfig) -> Result<PipelineIdentity, QueryError> {
        Ok(resolve_identity(
            config,
            self.name.as_deref(),
            self.version.as_deref(),
            self.step.as_deref(),
        )?)
    }
}

/// Filtered status listing plus summary counts.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub data_stage: String,
    pub total_participants: usize,
    pub total_sessions: usize,
    pub matching: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline: Option<PipelineIdentity>,
    pub records: Vec<StatusRecord>,
}

/// List participant-session pairs at a curation stage.
///
/// The pipeline selector is consulted only for [`DataStage::Processed`];
/// over-specifying it for another stage is harmless and ignored. Resolution
/// and parse errors propagate unchanged.
pub fn participants_sessions(
    root: &Path,
    stage: DataStage,
    selector: &PipelineSelector,
) -> Result<StatusReport, QueryError> {
    layout::ensure_root(root)?;
    let config = DatasetConfig::load(root)?;
    let manifest = Manifest::load(root)?;

    let identity = if stage == DataStage::Processed {
        Some(selector.resolve(&config)?)
    } else {
        if !selector.is_empty() {
            tracing::debug!(stage = %stage, "pipeline selector ignored for non-processed stage");
        }
        None
    };

    let nav = Navigator::new(root, &config);
    let all = aggregate(&nav, &manifest, identity.as_ref());

    let total_participants = all
        .iter()
        .map(|r| r.participant_id.as_str())
        .collect::<BTreeSet<_>>()
        .len();
    let total_sessions = all.len();

    let records: Vec<StatusRecord> = all
        .into_iter()
        .filter(|r| matches_stage(r, stage))
        .collect();

    Ok(StatusReport {
        data_stage: stage.as_str().to_string(),
        total_participants,
        total_sessions,
        matching: records.len(),
        pipeline: identity,
        records,
    })
}

fn matches_stage(record: &StatusRecord, stage: DataStage) -> bool {
    match stage {
        DataStage::All => true,
        DataStage::Imaging => record.has_imaging,
        DataStage::Downloaded => record.downloaded,
        DataStage::Organized => record.organized,
        DataStage::Bidsified => record.bidsified,
        DataStage::Processed => record.processed.unwrap_or(false),
    }
}

/// One installed pipeline as presented to callers.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineDetail {
    pub name: String,
    pub version: String,
    pub steps: Vec<String>,
    pub config_path: String,
    pub descriptor_path: String,
}

/// Summaries of every installed pipeline, in configuration order.
pub fn pipeline_details(config: &DatasetConfig) -> Vec<PipelineDetail> {
    config
        .pipelines
        .iter()
        .map(|entry| PipelineDetail {
            name: entry.name.clone(),
            version: entry.version.clone(),
            steps: entry.steps.clone(),
            config_path: format!(
                "{}/{}/{}",
                layout::DIR_PIPELINES,
                entry.dir_name(),
                entry.config_file
            ),
            descriptor_path: format!(
                "{}/{}/{}",
                layout::DIR_PIPELINES,
                entry.dir_name(),
                entry.descriptor_file
            ),
        })
        .collect()
}

/// Per-stage matching counts over all manifest pairs.
#[derive(Debug, Clone, Serialize)]
pub struct StageSummary {
    pub imaging: usize,
    pub downloaded: usize,
    pub organized: usize,
    pub bidsified: usize,
}

/// Dataset overview: metadata plus optional pipeline and status summaries.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetInfo {
    pub dataset_root: String,
    pub name: String,
    pub description: String,
    pub version: String,
    pub n_participants: usize,
    pub n_sessions: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipelines: Option<Vec<PipelineDetail>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_summary: Option<StageSummary>,
}

pub fn dataset_info(
    root: &Path,
    include_pipeline_details: bool,
    include_status_summary: bool,
) -> Result<DatasetInfo, QueryError> {
    layout::ensure_root(root)?;
    let config = DatasetConfig::load(root)?;
    let manifest = Manifest::load(root)?;

    let pairs = manifest.participant_session_pairs();
    let n_participants = pairs
        .iter()
        .map(|(p, _)| p.as_str())
        .collect::<BTreeSet<_>>()
        .len();
    let n_sessions = pairs.len();

    let pipelines = include_pipeline_details.then(|| pipeline_details(&config));

    let status_summary = if include_status_summary {
        let nav = Navigator::new(root, &config);
        let records = aggregate(&nav, &manifest, None);
        Some(StageSummary {
            imaging: records.iter().filter(|r| r.has_imaging).count(),
            downloaded: records.iter().filter(|r| r.downloaded).count(),
            organized: records.iter().filter(|r| r.organized).count(),
            bidsified: records.iter().filter(|r| r.bidsified).count(),
        })
    } else {
        None
    };

    Ok(DatasetInfo {
        dataset_root: root.display().to_string(),
        name: config.name,
        description: config.description,
        version: config.version,
        n_participants,
        n_sessions,
        pipelines,
        status_summary,
    })
}

/// A resolved logical location and whether it currently exists.
#[derive(Debug, Clone, Serialize)]
pub struct NavigationResult {
    pub path_type: String,
    pub path: String,
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline: Option<PipelineIdentity>,
}

/// Resolve a logical location descriptor to a concrete path.
///
/// Pipeline-scoped descriptors run identity resolution first, so an unknown
/// pipeline name surfaces as `PipelineNotFound`, not as a missing path.
pub fn navigate(
    root: &Path,
    path_type: PathType,
    target: Option<&str>,
    selector: &PipelineSelector,
) -> Result<NavigationResult, QueryError> {
    layout::ensure_root(root)?;
    let config = DatasetConfig::load(root)?;

    let identity = if path_type.is_pipeline_scoped() {
        Some(selector.resolve(&config)?)
    } else {
        None
    };

    let nav = Navigator::new(root, &config);
    let path = nav.resolve(path_type, target, identity.as_ref())?;

    Ok(NavigationResult {
        path_type: path_type.as_str().to_string(),
        exists: path.exists(),
        path: path.display().to_string(),
        pipeline: identity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// Fixture: sub-01 (ses-01, ses-02) and sub-02 (ses-01); only
    /// sub-01/ses-01 has a BIDS subtree; fmriprep installed at two versions
    /// and mriqc at one.
    fn fixture() -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("global_config.json"),
            r#"{
                "DATASET_NAME": "demo-study",
                "DATASET_DESCRIPTION": "Demo",
                "VERSION": "0.1.0",
                "PROC_PIPELINES": [
                    {"NAME": "fmriprep", "VERSION": "20.2.7", "STEPS": ["run"]},
                    {"NAME": "fmriprep", "VERSION": "23.2.0", "STEPS": ["prepare", "run"]},
                    {"NAME": "mriqc", "VERSION": "0.16.1", "STEPS": ["run"]}
                ]
            }"#,
        )
        .unwrap();
        fs::write(
            tmp.path().join("manifest.tsv"),
            "participant_id\tsession_id\tdatatype\n\
             sub-01\tses-01\tanat\n\
             sub-01\tses-02\tanat\n\
             sub-02\tses-01\t\n",
        )
        .unwrap();
        fs::create_dir_all(tmp.path().join("bids/sub-01/ses-01")).unwrap();
        tmp
    }

    #[test]
    fn test_bidsified_filter() {
        let tmp = fixture();
        let report =
            participants_sessions(tmp.path(), DataStage::Bidsified, &PipelineSelector::default())
                .unwrap();
        assert_eq!(report.total_participants, 2);
        assert_eq!(report.total_sessions, 3);
        assert_eq!(report.matching, 1);
        assert_eq!(report.records[0].participant_id, "sub-01");
        assert_eq!(report.records[0].session_id, "ses-01");
    }

    #[test]
    fn test_all_returns_every_pair_once() {
        let tmp = fixture();
        let report =
            participants_sessions(tmp.path(), DataStage::All, &PipelineSelector::default())
                .unwrap();
        assert_eq!(report.matching, 3);

        let mut pairs: Vec<(String, String)> = report
            .records
            .iter()
            .map(|r| (r.participant_id.clone(), r.session_id.clone()))
            .collect();
        let len_before = pairs.len();
        pairs.dedup();
        assert_eq!(pairs.len(), len_before);
    }

    #[test]
    fn test_imaging_filter() {
        let tmp = fixture();
        let report =
            participants_sessions(tmp.path(), DataStage::Imaging, &PipelineSelector::default())
                .unwrap();
        // sub-02/ses-01 has an empty datatype cell.
        assert_eq!(report.matching, 2);
    }

    #[test]
    fn test_processed_resolves_pipeline_and_filters() {
        let tmp = fixture();
        fs::create_dir_all(
            tmp.path()
                .join("derivatives/fmriprep/23.2.0/prepare/sub-01/ses-02"),
        )
        .unwrap();

        let selector = PipelineSelector {
            name: Some("fmriprep".to_string()),
            ..Default::default()
        };
        let report =
            participants_sessions(tmp.path(), DataStage::Processed, &selector).unwrap();
        let identity = report.pipeline.as_ref().unwrap();
        assert_eq!(identity.version, "23.2.0");
        assert_eq!(identity.step, "prepare");
        assert_eq!(report.matching, 1);
        assert_eq!(report.records[0].session_id, "ses-02");
    }

    #[test]
    fn test_processed_bad_step() {
        let tmp = fixture();
        let selector = PipelineSelector {
            name: Some("mriqc".to_string()),
            version: Some("0.16.1".to_string()),
            step: Some("bad_step".to_string()),
        };
        let err =
            participants_sessions(tmp.path(), DataStage::Processed, &selector).unwrap_err();
        assert_eq!(err.kind(), "pipeline_step_not_found");
    }

    #[test]
    fn test_processed_without_name_is_ambiguous() {
        let tmp = fixture();
        let err = participants_sessions(
            tmp.path(),
            DataStage::Processed,
            &PipelineSelector::default(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), "ambiguous_pipeline");
    }

    #[test]
    fn test_invalid_stage_token() {
        let err = "everything".parse::<DataStage>().unwrap_err();
        assert_eq!(err.kind(), "invalid_parameter");
        assert!("bidsified".parse::<DataStage>().is_ok());
    }

    #[test]
    fn test_missing_manifest_is_hard_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("global_config.json"),
            r#"{"DATASET_NAME": "demo"}"#,
        )
        .unwrap();
        let err =
            participants_sessions(tmp.path(), DataStage::All, &PipelineSelector::default())
                .unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[test]
    fn test_dataset_info_summaries() {
        let tmp = fixture();
        let info = dataset_info(tmp.path(), true, true).unwrap();
        assert_eq!(info.name, "demo-study");
        assert_eq!(info.n_participants, 2);
        assert_eq!(info.n_sessions, 3);
        let pipelines = info.pipelines.unwrap();
        assert_eq!(pipelines.len(), 3);
        assert_eq!(
            pipelines[1].config_path,
            "pipelines/fmriprep-23.2.0/config.json"
        );
        let summary = info.status_summary.unwrap();
        assert_eq!(summary.bidsified, 1);
        assert_eq!(summary.downloaded, 0);

        let bare = dataset_info(tmp.path(), false, false).unwrap();
        assert!(bare.pipelines.is_none());
        assert!(bare.status_summary.is_none());
    }

    #[test]
    fn test_navigate_directory_and_pipeline() {
        let tmp = fixture();
        let result = navigate(
            tmp.path(),
            PathType::Directory,
            Some("bids"),
            &PipelineSelector::default(),
        )
        .unwrap();
        assert!(result.exists);
        assert!(result.path.ends_with("bids"));

        let selector = PipelineSelector {
            name: Some("mriqc".to_string()),
            ..Default::default()
        };
        let result = navigate(tmp.path(), PathType::PipelineConfig, None, &selector).unwrap();
        assert!(!result.exists);
        assert!(result.path.ends_with("pipelines/mriqc-0.16.1/config.json"));
    }

    #[test]
    fn test_navigate_unknown_pipeline_is_pipeline_not_found() {
        let tmp = fixture();
        let selector = PipelineSelector {
            name: Some("nonexistent".to_string()),
            ..Default::default()
        };
        let err = navigate(tmp.path(), PathType::PipelineConfig, None, &selector).unwrap_err();
        assert_eq!(err.kind(), "pipeline_not_found");
    }

    #[test]
    fn test_missing_root() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope");
        let err = dataset_info(&missing, false, false).unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }
}
