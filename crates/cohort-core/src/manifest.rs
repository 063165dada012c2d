//! Manifest table parsing.
//!
//! The manifest is a header-plus-rows table, tab- or comma-separated (the
//! delimiter is sniffed from the header). Parsing is two-stage: a raw line
//! split, then schema validation against the required columns. Cell quoting
//! is not part of the format.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::CoreError;
use crate::layout;

pub const COL_PARTICIPANT: &str = "participant_id";
pub const COL_SESSION: &str = "session_id";
pub const COL_DATATYPE: &str = "datatype";

/// One manifest row. `(participant_id, session_id)` pairs are the unit of
/// status aggregation; several rows per pair (one per datatype) are normal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestRecord {
    pub participant_id: String,
    /// Empty for a session-less participant.
    pub session_id: String,
    /// Empty when the manifest has no datatype column or the cell is blank.
    pub datatype: String,
    /// Any further columns, verbatim (availability flags and the like).
    pub extras: BTreeMap<String, String>,
}

/// A parsed manifest plus the raw text it came from, in file order.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub path: PathBuf,
    pub records: Vec<ManifestRecord>,
    raw: String,
}

impl Manifest {
    /// Locate the manifest file under a dataset root.
    pub fn locate(root: &Path) -> Result<PathBuf, CoreError> {
        for name in layout::MANIFEST_CANDIDATES {
            let path = root.join(name);
            if path.is_file() {
                return Ok(path);
            }
        }
        Err(CoreError::ManifestNotFound {
            root: root.to_path_buf(),
        })
    }

    /// Locate, read, and validate the manifest for a dataset root.
    pub fn load(root: &Path) -> Result<Self, CoreError> {
        let path = Self::locate(root)?;
        let raw = fs::read_to_string(&path).map_err(|e| CoreError::from_io(e, &path))?;
        let records = parse_table(&raw, &path)?;
        tracing::debug!(path = %path.display(), records = records.len(), "parsed manifest");
        Ok(Self { path, records, raw })
    }

    /// The raw table text as read from disk.
    pub fn raw_text(&self) -> &str {
        &self.raw
    }

    /// Raw text truncated to `max_rows` data rows (header preserved).
    /// Returns the text and whether truncation happened.
    pub fn raw_rows(&self, max_rows: Option<usize>) -> (String, bool) {
        let lines: Vec<&str> = self.raw.lines().collect();
        match max_rows {
            // Saturate: max_rows comes from callers, usize::MAX means "all".
            Some(max) if lines.len() > max.saturating_add(1) => {
                (lines[..max + 1].join("\n"), true)
            }
            _ => (lines.join("\n"), false),
        }
    }

    /// Unique `(participant_id, session_id)` pairs in first-seen order.
    pub fn participant_session_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = Vec::new();
        for rec in &self.records {
            let pair = (rec.participant_id.clone(), rec.session_id.clone());
            if !pairs.contains(&pair) {
                pairs.push(pair);
            }
        }
        pairs
    }
}

fn sniff_delimiter(header: &str) -> char {
    if header.contains('\t') {
        '\t'
    } else {
        ','
    }
}

fn malformed(path: &Path, reason: impl Into<String>) -> CoreError {
    CoreError::ManifestMalformed {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

fn parse_table(raw: &str, path: &Path) -> Result<Vec<ManifestRecord>, CoreError> {
    let mut lines = raw.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());
    let (_, header) = lines.next().ok_or_else(|| malformed(path, "empty file"))?;
    let delim = sniff_delimiter(header);
    let columns: Vec<&str> = header.split(delim).map(str::trim).collect();

    let participant_idx = columns
        .iter()
        .position(|c| *c == COL_PARTICIPANT)
        .ok_or_else(|| malformed(path, format!("missing required column {COL_PARTICIPANT}")))?;
    let session_idx = columns
        .iter()
        .position(|c| *c == COL_SESSION)
        .ok_or_else(|| malformed(path, format!("missing required column {COL_SESSION}")))?;
    let datatype_idx = columns.iter().position(|c| *c == COL_DATATYPE);

    let mut records = Vec::new();
    for (lineno, line) in lines {
        let cells: Vec<&str> = line.split(delim).map(str::trim).collect();
        let cell = |idx: usize| cells.get(idx).copied().unwrap_or("").to_string();

        let participant_id = cell(participant_idx);
        if participant_id.is_empty() {
            return Err(malformed(
                path,
                format!("line {}: empty {COL_PARTICIPANT}", lineno + 1),
            ));
        }

        let mut extras = BTreeMap::new();
        for (idx, name) in columns.iter().enumerate() {
            if idx == participant_idx || idx == session_idx || Some(idx) == datatype_idx {
                continue;
            }
            extras.insert(name.to_string(), cell(idx));
        }

        records.push(ManifestRecord {
            participant_id,
            session_id: cell(session_idx),
            datatype: datatype_idx.map(cell).unwrap_or_default(),
            extras,
        });
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_tsv() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("manifest.tsv"),
            "participant_id\tsession_id\tdatatype\nsub-01\tses-01\tanat\nsub-01\tses-01\tfunc\nsub-02\t\t\n",
        )
        .unwrap();

        let manifest = Manifest::load(tmp.path()).unwrap();
        assert_eq!(manifest.records.len(), 3);
        assert_eq!(manifest.records[0].participant_id, "sub-01");
        assert_eq!(manifest.records[0].datatype, "anat");
        assert_eq!(manifest.records[2].session_id, "");
        assert_eq!(
            manifest.participant_session_pairs(),
            vec![
                ("sub-01".to_string(), "ses-01".to_string()),
                ("sub-02".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn test_parse_csv_with_extras() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("manifest.csv"),
            "participant_id,session_id,datatype,downloaded\nsub-01,ses-01,anat,true\n",
        )
        .unwrap();

        let manifest = Manifest::load(tmp.path()).unwrap();
        assert_eq!(manifest.records.len(), 1);
        assert_eq!(
            manifest.records[0].extras.get("downloaded").map(String::as_str),
            Some("true")
        );
    }

    #[test]
    fn test_tsv_preferred_over_csv() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("manifest.tsv"),
            "participant_id\tsession_id\nsub-01\tses-01\n",
        )
        .unwrap();
        fs::write(
            tmp.path().join("manifest.csv"),
            "participant_id,session_id\nsub-99,ses-99\n",
        )
        .unwrap();

        let manifest = Manifest::load(tmp.path()).unwrap();
        assert_eq!(manifest.records[0].participant_id, "sub-01");
    }

    #[test]
    fn test_missing_manifest() {
        let tmp = TempDir::new().unwrap();
        let err = Manifest::load(tmp.path()).unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[test]
    fn test_missing_required_column() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("manifest.tsv"), "participant_id\nsub-01\n").unwrap();
        let err = Manifest::load(tmp.path()).unwrap_err();
        assert_eq!(err.kind(), "malformed");
        assert!(err.to_string().contains("session_id"));
    }

    #[test]
    fn test_empty_participant_rejected() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("manifest.tsv"),
            "participant_id\tsession_id\n\tses-01\n",
        )
        .unwrap();
        let err = Manifest::load(tmp.path()).unwrap_err();
        assert_eq!(err.kind(), "malformed");
    }

    #[test]
    fn test_raw_rows_truncation() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("manifest.tsv"),
            "participant_id\tsession_id\nsub-01\tses-01\nsub-02\tses-01\nsub-03\tses-01\n",
        )
        .unwrap();

        let manifest = Manifest::load(tmp.path()).unwrap();
        let (full, truncated) = manifest.raw_rows(None);
        assert!(!truncated);
        assert_eq!(full.lines().count(), 4);

        let (cut, truncated) = manifest.raw_rows(Some(2));
        assert!(truncated);
        assert_eq!(cut.lines().count(), 3); // header + 2 rows
        assert!(cut.contains("sub-02"));
        assert!(!cut.contains("sub-03"));

        let (all, truncated) = manifest.raw_rows(Some(usize::MAX));
        assert!(!truncated);
        assert_eq!(all.lines().count(), 4);
    }
}
