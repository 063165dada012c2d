//! Deprecated call shapes retained for older clients.
//!
//! Each alias maps onto exactly one canonical query call with a fixed
//! stage argument and reshapes the result; the core exposes only the
//! canonical operations.

use std::path::Path;

use serde::Serialize;
use serde_json::json;

use cohort_query::{participants_sessions, DataStage, PipelineSelector};

#[derive(Debug, Serialize)]
struct LegacySubject {
    subject_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sessions: Option<Vec<String>>,
}

/// Legacy `list_subjects`: participant-session pairs present under the BIDS
/// root, grouped per subject.
pub(crate) fn list_subjects(root: &Path) -> Result<String, String> {
    tracing::warn!(
        "list_subjects is deprecated; use get_participants_sessions with data_stage=\"bidsified\""
    );

    let report = participants_sessions(root, DataStage::Bidsified, &PipelineSelector::default())
        .map_err(crate::fail)?;

    let mut subjects: Vec<LegacySubject> = Vec::new();
    for rec in &report.records {
        match subjects
            .iter_mut()
            .find(|s| s.subject_id == rec.participant_id)
        {
            Some(subject) => {
                if !rec.session_id.is_empty() {
                    subject
                        .sessions
                        .get_or_insert_with(Vec::new)
                        .push(rec.session_id.clone());
                }
            }
            None => subjects.push(LegacySubject {
                subject_id: rec.participant_id.clone(),
                sessions: if rec.session_id.is_empty() {
                    None
                } else {
                    Some(vec![rec.session_id.clone()])
                },
            }),
        }
    }

    serde_json::to_string_pretty(&json!({
        "subjects": subjects,
        "count": subjects.len(),
    }))
    .map_err(|e| format!("[serialization] {e}"))
}
