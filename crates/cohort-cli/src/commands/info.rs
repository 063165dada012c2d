use std::path::Path;

use anyhow::Result;
use clap::Args;

use cohort_query::dataset_info;

use crate::output::format::format_dataset_info;
use crate::output::OutputFormat;

#[derive(Args)]
pub struct InfoArgs {
    /// Include per-pipeline details
    #[arg(long)]
    pub pipelines: bool,

    /// Include per-stage matching counts
    #[arg(long)]
    pub summary: bool,
}

pub fn run(root: &Path, args: &InfoArgs, format: OutputFormat) -> Result<()> {
    let info = dataset_info(root, args.pipelines, args.summary)?;
    print!("{}", format_dataset_info(&info, format));
    Ok(())
}
