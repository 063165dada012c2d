//! Pipeline identity resolution.
//!
//! Every pipeline-scoped query goes through [`resolve_identity`], which turns
//! a possibly-partial `(name, version, step)` triple into a fully populated
//! one. The name must be explicit whenever more than one pipeline is
//! installed; version and step may default (highest version, first declared
//! step). Consolidating the defaulting here keeps it one testable algorithm
//! instead of a per-call-path convention.

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

use crate::config::DatasetConfig;
use crate::error::CoreError;

/// A resolved `(name, version, step)` triple. Created transiently per
/// request; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineIdentity {
    pub name: String,
    pub version: String,
    pub step: String,
}

impl fmt::Display for PipelineIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} [{}]", self.name, self.version, self.step)
    }
}

/// Resolve a possibly-partial pipeline selection against the installed set.
///
/// - `name` omitted: allowed only when exactly one distinct name is
///   installed; otherwise [`CoreError::AmbiguousPipeline`].
/// - `version` omitted: highest version by numeric-segment ordering among
///   matching-name entries; identical version strings keep the
///   first-encountered entry in configuration order.
/// - `step` omitted: the entry's first declared step.
///
/// A fully specified valid triple resolves to exactly itself.
pub fn resolve_identity(
    config: &DatasetConfig,
    name: Option<&str>,
    version: Option<&str>,
    step: Option<&str>,
) -> Result<PipelineIdentity, CoreError> {
    let name = match name {
        Some(n) => n.to_string(),
        None => {
            let names = config.pipeline_names();
            match names.as_slice() {
                [] => return Err(CoreError::NoPipelines),
                [only] => only.to_string(),
                _ => {
                    return Err(CoreError::AmbiguousPipeline {
                        count: names.len(),
                    })
                }
            }
        }
    };

    let matching: Vec<_> = config.versions_of(&name).collect();
    if matching.is_empty() {
        return Err(CoreError::PipelineNotFound { name });
    }

    let entry = match version {
        Some(v) => matching
            .iter()
            .find(|p| p.version == v)
            .copied()
            .ok_or_else(|| CoreError::PipelineVersionNotFound {
                name: name.clone(),
                version: v.to_string(),
            })?,
        None => {
            // Strict greater-than keeps the first-encountered entry on ties.
            let mut best = matching[0];
            for candidate in &matching[1..] {
                if cmp_versions(&candidate.version, &best.version) == Ordering::Greater {
                    best = candidate;
                }
            }
            best
        }
    };

    let step = match step {
        Some(s) => {
            if entry.steps.iter().any(|declared| declared == s) {
                s.to_string()
            } else {
                return Err(CoreError::PipelineStepNotFound {
                    name: entry.name.clone(),
                    version: entry.version.clone(),
                    step: s.to_string(),
                    available: entry.steps.join(", "),
                });
            }
        }
        None => entry
            .steps
            .first()
            .cloned()
            .unwrap_or_else(|| "default".to_string()),
    };

    Ok(PipelineIdentity {
        name: entry.name.clone(),
        version: entry.version.clone(),
        step,
    })
}

/// Compare two version strings by `.`/`-`-separated segments.
///
/// Numeric segments compare numerically (so "23.2.0" > "3.2.0"), mixed
/// positions order the numeric segment above the non-numeric one, and two
/// non-numeric segments fall back to string order. Extra numeric segments
/// beyond a shared prefix raise a version ("1.0.1" > "1.0"); extra
/// non-numeric segments lower it, so a pre-release tag sorts below its
/// release ("1.0.0-beta" < "1.0.0"). Total and deterministic for arbitrary
/// strings.
pub fn cmp_versions(a: &str, b: &str) -> Ordering {
    let sa: Vec<&str> = a.split(['.', '-']).collect();
    let sb: Vec<&str> = b.split(['.', '-']).collect();
    for i in 0..sa.len().max(sb.len()) {
        let ord = match (sa.get(i), sb.get(i)) {
            (None, None) => Ordering::Equal,
            (None, Some(y)) => {
                if y.parse::<u64>().is_ok() {
                    Ordering::Less
                } else {
                    Ordering::Greater
                }
            }
            (Some(x), None) => {
                if x.parse::<u64>().is_ok() {
                    Ordering::Greater
                } else {
                    Ordering::Less
                }
            }
            (Some(x), Some(y)) => match (x.parse::<u64>(), y.parse::<u64>()) {
                (Ok(nx), Ok(ny)) => nx.cmp(&ny),
                (Ok(_), Err(_)) => Ordering::Greater,
                (Err(_), Ok(_)) => Ordering::Less,
                (Err(_), Err(_)) => x.cmp(y),
            },
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineEntry;

    fn entry(name: &str, version: &str, steps: &[&str]) -> PipelineEntry {
        PipelineEntry {
            name: name.to_string(),
            version: version.to_string(),
            steps: steps.iter().map(|s| s.to_string()).collect(),
            config_file: "config.json".to_string(),
            descriptor_file: "descriptor.json".to_string(),
        }
    }

    fn config(entries: Vec<PipelineEntry>) -> DatasetConfig {
        DatasetConfig {
            name: "demo".to_string(),
            description: String::new(),
            version: String::new(),
            pipelines: entries,
        }
    }

    #[test]
    fn test_fully_specified_is_identity() {
        let cfg = config(vec![entry("fmriprep", "23.2.0", &["prepare", "run"])]);
        let id = resolve_identity(&cfg, Some("fmriprep"), Some("23.2.0"), Some("run")).unwrap();
        assert_eq!(
            id,
            PipelineIdentity {
                name: "fmriprep".to_string(),
                version: "23.2.0".to_string(),
                step: "run".to_string(),
            }
        );
    }

    #[test]
    fn test_version_defaults_to_highest() {
        let cfg = config(vec![
            entry("fmriprep", "20.2.7", &["run"]),
            entry("fmriprep", "23.2.0", &["prepare", "run"]),
        ]);
        let id = resolve_identity(&cfg, Some("fmriprep"), None, None).unwrap();
        assert_eq!(id.version, "23.2.0");
        assert_eq!(id.step, "prepare");
    }

    #[test]
    fn test_highest_version_is_numeric_not_lexicographic() {
        let cfg = config(vec![
            entry("mriqc", "9.1.0", &["run"]),
            entry("mriqc", "23.1.0", &["run"]),
        ]);
        let id = resolve_identity(&cfg, Some("mriqc"), None, None).unwrap();
        assert_eq!(id.version, "23.1.0");
    }

    #[test]
    fn test_version_tie_keeps_config_order() {
        let cfg = config(vec![
            entry("qsiprep", "1.0.0", &["first"]),
            entry("qsiprep", "1.0.0", &["second"]),
        ]);
        let id = resolve_identity(&cfg, Some("qsiprep"), None, None).unwrap();
        assert_eq!(id.step, "first");
        // Re-running yields the same pick.
        let again = resolve_identity(&cfg, Some("qsiprep"), None, None).unwrap();
        assert_eq!(id, again);
    }

    #[test]
    fn test_name_omitted_single_pipeline() {
        let cfg = config(vec![
            entry("fmriprep", "20.2.7", &["run"]),
            entry("fmriprep", "23.2.0", &["run"]),
        ]);
        let id = resolve_identity(&cfg, None, None, None).unwrap();
        assert_eq!(id.name, "fmriprep");
        assert_eq!(id.version, "23.2.0");
    }

    #[test]
    fn test_name_omitted_multiple_pipelines_is_ambiguous() {
        let cfg = config(vec![
            entry("fmriprep", "23.2.0", &["run"]),
            entry("mriqc", "0.16.1", &["run"]),
        ]);
        let err = resolve_identity(&cfg, None, None, None).unwrap_err();
        assert_eq!(err.kind(), "ambiguous_pipeline");
    }

    #[test]
    fn test_name_omitted_no_pipelines() {
        let cfg = config(vec![]);
        let err = resolve_identity(&cfg, None, None, None).unwrap_err();
        assert_eq!(err.kind(), "ambiguous_pipeline");
    }

    #[test]
    fn test_unknown_name() {
        let cfg = config(vec![entry("fmriprep", "23.2.0", &["run"])]);
        let err = resolve_identity(&cfg, Some("nonexistent"), None, None).unwrap_err();
        assert_eq!(err.kind(), "pipeline_not_found");
    }

    #[test]
    fn test_unknown_version() {
        let cfg = config(vec![entry("fmriprep", "23.2.0", &["run"])]);
        let err = resolve_identity(&cfg, Some("fmriprep"), Some("1.0.0"), None).unwrap_err();
        assert_eq!(err.kind(), "pipeline_version_not_found");
    }

    #[test]
    fn test_unknown_step() {
        let cfg = config(vec![entry("mriqc", "0.16.1", &["run"])]);
        let err =
            resolve_identity(&cfg, Some("mriqc"), Some("0.16.1"), Some("bad_step")).unwrap_err();
        assert_eq!(err.kind(), "pipeline_step_not_found");
        assert!(err.to_string().contains("bad_step"));
    }

    #[test]
    fn test_cmp_versions() {
        assert_eq!(cmp_versions("23.2.0", "20.2.7"), Ordering::Greater);
        assert_eq!(cmp_versions("0.16.1", "0.16.1"), Ordering::Equal);
        assert_eq!(cmp_versions("1.0", "1.0.1"), Ordering::Less);
        assert_eq!(cmp_versions("1.10.0", "1.9.9"), Ordering::Greater);
        assert_eq!(cmp_versions("1.0.1", "1.0.0-beta"), Ordering::Greater);
    }

    #[test]
    fn test_prerelease_sorts_below_release() {
        assert_eq!(cmp_versions("1.0.0", "1.0.0-beta"), Ordering::Greater);
        assert_eq!(cmp_versions("1.0.0-beta", "1.0.0"), Ordering::Less);

        let cfg = config(vec![
            entry("fmriprep", "24.0.0-rc1", &["run"]),
            entry("fmriprep", "24.0.0", &["run"]),
        ]);
        let id = resolve_identity(&cfg, Some("fmriprep"), None, None).unwrap();
        assert_eq!(id.version, "24.0.0");
    }
}
