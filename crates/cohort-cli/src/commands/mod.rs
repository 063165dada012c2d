pub mod config;
pub mod info;
pub mod manifest;
pub mod mcp;
pub mod navigate;
pub mod pipelines;
pub mod status;

use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Show dataset metadata, optionally with pipeline and status summaries
    Info(info::InfoArgs),
    /// List participant-session pairs at a curation stage
    Status(status::StatusArgs),
    /// List installed processing pipelines
    Pipelines,
    /// Resolve a logical dataset location to a concrete path
    Navigate(navigate::NavigateArgs),
    /// Print the raw dataset configuration document
    Config,
    /// Print the manifest table
    Manifest(manifest::ManifestArgs),
    /// Serve the dataset over MCP on stdio
    Mcp,
}
