use std::path::Path;

use anyhow::Result;
use clap::Args;

use cohort_core::navigate::PathType;
use cohort_query::{navigate, PipelineSelector};

use crate::output::format::format_navigation;
use crate::output::OutputFormat;

#[derive(Args)]
pub struct NavigateArgs {
    /// One of: dataset_root, directory, pipeline_config, pipeline_descriptor, pipeline_output
    pub path_type: String,

    /// Directory name for path_type=directory (sourcedata, organized, bids,
    /// derivatives, pipelines, tabular)
    #[arg(long)]
    pub target: Option<String>,

    /// Pipeline name for pipeline-scoped path types
    #[arg(long)]
    pub pipeline: Option<String>,

    /// Pipeline version (default: highest installed)
    #[arg(long)]
    pub pipeline_version: Option<String>,
}

pub fn run(root: &Path, args: &NavigateArgs, format: OutputFormat) -> Result<()> {
    let path_type = PathType::parse(&args.path_type)?;
    let selector = PipelineSelector {
        name: args.pipeline.clone(),
        version: args.pipeline_version.clone(),
        step: None,
    };
    let result = navigate(root, path_type, args.target.as_deref(), &selector)?;
    print!("{}", format_navigation(&result, format));
    Ok(())
}
