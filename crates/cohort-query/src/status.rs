//! Stage status aggregation across the curation pipeline.

use std::collections::HashMap;

use serde::Serialize;

use cohort_core::layout;
use cohort_core::manifest::Manifest;
use cohort_core::navigate::Navigator;
use cohort_core::pipeline::PipelineIdentity;

/// Per participant-session stage observations.
///
/// Flags are independent observations, not a monotonic progression: a
/// dataset under active reorganization may show processed output without a
/// matching BIDS subtree (externally supplied derivatives), so no stage
/// implies an earlier one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusRecord {
    pub participant_id: String,
    /// Empty for a session-less participant.
    pub session_id: String,
    /// Any manifest row for this pair carries a non-empty datatype.
    pub has_imaging: bool,
    /// Raw source data present under `sourcedata/`.
    pub downloaded: bool,
    /// Present in the post-reorganization layout under `organized/`.
    pub organized: bool,
    /// A participant-session subtree exists under the BIDS root.
    pub bidsified: bool,
    /// Output artifact location exists for the resolved pipeline identity.
    /// `None` when the query resolved no identity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed: Option<bool>,
}

/// Compute a [`StatusRecord`] for every `(participant_id, session_id)` pair
/// in the manifest, deduplicated in first-seen order.
///
/// Each stage check is a single stat on the pair's expected location. A
/// missing directory is a `false` observation, never an error; the only
/// hard failures happen earlier, when the manifest or configuration is
/// loaded.
pub fn aggregate(
    nav: &Navigator<'_>,
    manifest: &Manifest,
    identity: Option<&PipelineIdentity>,
) -> Vec<StatusRecord> {
    let mut order: Vec<(String, String)> = Vec::new();
    let mut imaging: HashMap<(String, String), bool> = HashMap::new();

    for rec in &manifest.records {
        let key = (rec.participant_id.clone(), rec.session_id.clone());
        if !imaging.contains_key(&key) {
            order.push(key.clone());
            imaging.insert(key.clone(), false);
        }
        if !rec.datatype.is_empty() {
            imaging.insert(key, true);
        }
    }

    tracing::debug!(
        pairs = order.len(),
        pipeline = ?identity,
        "aggregating stage status"
    );

    order
        .into_iter()
        .map(|(participant_id, session_id)| {
            let has_imaging = imaging[&(participant_id.clone(), session_id.clone())];
            let downloaded = nav
                .pair_dir(layout::DIR_SOURCEDATA, &participant_id, &session_id)
                .exists();
            let organized = nav
                .pair_dir(layout::DIR_ORGANIZED, &participant_id, &session_id)
                .exists();
            let bidsified = nav
                .pair_dir(layout::DIR_BIDS, &participant_id, &session_id)
                .exists();
            let processed = identity.map(|id| {
                nav.processed_pair_dir(id, &participant_id, &session_id)
                    .exists()
            });
            StatusRecord {
                participant_id,
                session_id,
                has_imaging,
                downloaded,
                organized,
                bidsified,
                processed,
            }
        })
        .collect()
}
