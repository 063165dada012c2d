use std::path::Path;

use anyhow::Result;

use cohort_core::{layout, DatasetConfig};
use cohort_query::pipeline_details;

use crate::output::format::format_pipelines;
use crate::output::OutputFormat;

pub fn run(root: &Path, format: OutputFormat) -> Result<()> {
    layout::ensure_root(root)?;
    let config = DatasetConfig::load(root)?;
    print!("{}", format_pipelines(&pipeline_details(&config), format));
    Ok(())
}
