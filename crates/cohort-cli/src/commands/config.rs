use std::path::Path;

use anyhow::Result;

use cohort_query::read_config_document;

pub fn run(root: &Path) -> Result<()> {
    let value = read_config_document(root)?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
