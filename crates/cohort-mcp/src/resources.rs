//! Passive context resources under the `cohort://` scheme.
//!
//! Stable identifiers:
//! - `cohort://dataset/config`
//! - `cohort://dataset/manifest`
//! - `cohort://pipelines/<name>/<version>/config`
//! - `cohort://pipelines/<name>/<version>/descriptor`

use std::path::Path;

use rmcp::model::{AnnotateAble, RawResource, ReadResourceResult, Resource, ResourceContents};
use rmcp::ErrorData as McpError;
use serde_json::json;

use cohort_core::DatasetConfig;
use cohort_query::{
    read_config_document, read_manifest_table, read_pipeline_document, PipelineDocKind,
    PipelineSelector, QueryError,
};

pub const SCHEME: &str = "cohort://";

fn resource(uri: String, name: String) -> Resource {
    RawResource::new(uri, name).no_annotation()
}

/// Enumerate available resources. The two dataset documents are always
/// listed; pipeline documents require a readable configuration, and a
/// broken dataset degrades to the static pair rather than an error.
pub fn list(root: &Path) -> Vec<Resource> {
    let mut out = vec![
        resource(
            format!("{SCHEME}dataset/config"),
            "Dataset configuration".to_string(),
        ),
        resource(
            format!("{SCHEME}dataset/manifest"),
            "Dataset manifest".to_string(),
        ),
    ];

    match DatasetConfig::load(root) {
        Ok(config) => {
            for entry in &config.pipelines {
                out.push(resource(
                    format!("{SCHEME}pipelines/{}/{}/config", entry.name, entry.version),
                    format!("{} {} configuration", entry.name, entry.version),
                ));
                out.push(resource(
                    format!(
                        "{SCHEME}pipelines/{}/{}/descriptor",
                        entry.name, entry.version
                    ),
                    format!("{} {} descriptor", entry.name, entry.version),
                ));
            }
        }
        Err(e) => tracing::debug!(error = %e, "pipeline resources unavailable"),
    }
    out
}

/// Read one resource by URI.
pub fn read(root: &Path, uri: &str) -> Result<ReadResourceResult, McpError> {
    let Some(rest) = uri.strip_prefix(SCHEME) else {
        return Err(unknown_uri(uri));
    };
    let segments: Vec<&str> = rest.split('/').collect();

    let text = match segments.as_slice() {
        ["dataset", "config"] => read_config_document(root)
            .map(|v| pretty(&v))
            .map_err(|e| query_err(uri, e))?,
        ["dataset", "manifest"] => read_manifest_table(root, None)
            .map(|t| t.content)
            .map_err(|e| query_err(uri, e))?,
        ["pipelines", name, version, doc] => {
            let kind = match *doc {
                "config" => PipelineDocKind::Config,
                "descriptor" => PipelineDocKind::Descriptor,
                _ => return Err(unknown_uri(uri)),
            };
            let selector = PipelineSelector {
                name: Some((*name).to_string()),
                version: Some((*version).to_string()),
                step: None,
            };
            read_pipeline_document(root, kind, &selector)
                .map(|d| pretty(&d.document))
                .map_err(|e| query_err(uri, e))?
        }
        _ => return Err(unknown_uri(uri)),
    };

    Ok(ReadResourceResult {
        contents: vec![ResourceContents::text(text, uri)],
    })
}

fn pretty(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn unknown_uri(uri: &str) -> McpError {
    McpError::resource_not_found(
        format!("Unknown resource URI: {uri}"),
        Some(json!({ "uri": uri })),
    )
}

fn query_err(uri: &str, e: QueryError) -> McpError {
    let message = format!("[{}] {e}", e.kind());
    match e.kind() {
        "not_found" | "pipeline_not_found" | "pipeline_version_not_found" => {
            McpError::resource_not_found(message, Some(json!({ "uri": uri })))
        }
        // Identity-resolution failures are caller mistakes, not server faults.
        "invalid_parameter" | "ambiguous_pipeline" | "pipeline_step_not_found" => {
            McpError::invalid_params(message, Some(json!({ "uri": uri })))
        }
        _ => McpError::internal_error(message, None),
    }
}
