use std::path::Path;

use anyhow::Result;
use clap::Args;

use cohort_query::read_manifest_table;

#[derive(Args)]
pub struct ManifestArgs {
    /// Maximum data rows to print
    #[arg(short = 'n', long)]
    pub max_rows: Option<usize>,
}

pub fn run(root: &Path, args: &ManifestArgs) -> Result<()> {
    let table = read_manifest_table(root, args.max_rows)?;
    println!("{}", table.content);
    if table.truncated {
        eprintln!(
            "(truncated: {} of {} rows shown)",
            table.returned_rows, table.total_rows
        );
    }
    Ok(())
}
