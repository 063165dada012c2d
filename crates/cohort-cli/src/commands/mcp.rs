use std::path::Path;

use anyhow::{Context, Result};

use cohort_core::layout;

pub fn run(root: &Path) -> Result<()> {
    layout::ensure_root(root).context("Dataset root does not exist")?;

    let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
    rt.block_on(async {
        cohort_mcp::run_stdio(root.to_path_buf())
            .await
            .map_err(|e| anyhow::anyhow!("MCP server error: {e}"))
    })
}
