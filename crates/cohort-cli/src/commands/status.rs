use std::path::Path;

use anyhow::Result;
use clap::Args;

use cohort_query::{participants_sessions, DataStage, PipelineSelector};

use crate::output::format::format_status_report;
use crate::output::OutputFormat;

#[derive(Args)]
pub struct StatusArgs {
    /// Curation stage: all, imaging, downloaded, organized, bidsified, processed
    #[arg(long, default_value = "all")]
    pub data_stage: String,

    /// Pipeline name (processed stage; required when several are installed)
    #[arg(long)]
    pub pipeline: Option<String>,

    /// Pipeline version (default: highest installed)
    #[arg(long)]
    pub pipeline_version: Option<String>,

    /// Pipeline step (default: first declared step)
    #[arg(long)]
    pub step: Option<String>,
}

pub fn run(root: &Path, args: &StatusArgs, format: OutputFormat) -> Result<()> {
    let stage: DataStage = args.data_stage.parse()?;
    let selector = PipelineSelector {
        name: args.pipeline.clone(),
        version: args.pipeline_version.clone(),
        step: args.step.clone(),
    };
    let report = participants_sessions(root, stage, &selector)?;
    print!("{}", format_status_report(&report, format));
    Ok(())
}
