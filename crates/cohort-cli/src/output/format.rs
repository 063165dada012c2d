use cohort_query::{DatasetInfo, NavigationResult, PipelineDetail, StatusReport};

use super::OutputFormat;

pub fn format_dataset_info(info: &DatasetInfo, fmt: OutputFormat) -> String {
    match fmt {
        OutputFormat::Json => serde_json::to_string_pretty(info).unwrap_or_default(),
        OutputFormat::Text => format_dataset_info_text(info),
    }
}

fn format_dataset_info_text(info: &DatasetInfo) -> String {
    let mut out = String::new();
    out.push_str(&format!("Dataset: {}\n", info.name));
    if !info.description.is_empty() {
        out.push_str(&format!("Description: {}\n", info.description));
    }
    if !info.version.is_empty() {
        out.push_str(&format!("Version: {}\n", info.version));
    }
    out.push_str(&format!("Root: {}\n", info.dataset_root));
    out.push_str(&format!(
        "Participants: {}  Sessions: {}\n",
        info.n_participants, info.n_sessions
    ));

    if let Some(pipelines) = &info.pipelines {
        out.push_str(&format!("\nPipelines ({}):\n", pipelines.len()));
        out.push_str(&format_pipelines_text(pipelines));
    }

    if let Some(summary) = &info.status_summary {
        out.push_str("\nStage summary:\n");
        out.push_str(&format!("  imaging:    {}\n", summary.imaging));
        out.push_str(&format!("  downloaded: {}\n", summary.downloaded));
        out.push_str(&format!("  organized:  {}\n", summary.organized));
        out.push_str(&format!("  bidsified:  {}\n", summary.bidsified));
    }

    out
}

pub fn format_status_report(report: &StatusReport, fmt: OutputFormat) -> String {
    match fmt {
        OutputFormat::Json => serde_json::to_string_pretty(report).unwrap_or_default(),
        OutputFormat::Text => format_status_report_text(report),
    }
}

fn format_status_report_text(report: &StatusReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Stage {}: {} of {} participant-session pair(s) ({} participant(s))\n",
        report.data_stage, report.matching, report.total_sessions, report.total_participants
    ));
    if let Some(pipeline) = &report.pipeline {
        out.push_str(&format!("Pipeline: {pipeline}\n"));
    }
    for r in &report.records {
        let session = if r.session_id.is_empty() {
            "(no session)"
        } else {
            &r.session_id
        };
        let mut stages = Vec::new();
        if r.has_imaging {
            stages.push("imaging");
        }
        if r.downloaded {
            stages.push("downloaded");
        }
        if r.organized {
            stages.push("organized");
        }
        if r.bidsified {
            stages.push("bidsified");
        }
        if r.processed == Some(true) {
            stages.push("processed");
        }
        out.push_str(&format!(
            "  {} / {}  [{}]\n",
            r.participant_id,
            session,
            stages.join(", ")
        ));
    }
    out
}

pub fn format_pipelines(details: &[PipelineDetail], fmt: OutputFormat) -> String {
    match fmt {
        OutputFormat::Json => serde_json::to_string_pretty(details).unwrap_or_default(),
        OutputFormat::Text => format_pipelines_text(details),
    }
}

fn format_pipelines_text(details: &[PipelineDetail]) -> String {
    if details.is_empty() {
        return "No pipelines installed.\n".to_string();
    }
    let mut out = String::new();
    for d in details {
        out.push_str(&format!(
            "  {} {}  steps: {}\n",
            d.name,
            d.version,
            d.steps.join(" -> ")
        ));
    }
    out
}

pub fn format_navigation(result: &NavigationResult, fmt: OutputFormat) -> String {
    match fmt {
        OutputFormat::Json => serde_json::to_string_pretty(result).unwrap_or_default(),
        OutputFormat::Text => {
            let marker = if result.exists { "" } else { " (missing)" };
            format!("{}{marker}\n", result.path)
        }
    }
}
