//! MCP server exposing dataset status to AI agents.
//!
//! Tools cover the canonical query surface (dataset info, participant-session
//! status, navigation, raw document reads); the same documents are also
//! published as resources under the `cohort://` scheme. Each call resolves
//! its dataset root and re-reads on-disk state; the server holds no state
//! beyond the default root.

mod compat;
mod resources;

use std::path::PathBuf;

use rmcp::model::{
    ListResourcesResult, PaginatedRequestParam, ReadResourceRequestParam, ReadResourceResult,
    ServerCapabilities, ServerInfo,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler,
};
use schemars::JsonSchema;
use serde::Deserialize;

use cohort_core::layout;
use cohort_core::navigate::PathType;
use cohort_query::{
    dataset_info, list_directory, navigate, participants_sessions, pipeline_details,
    read_config_document, read_dataset_file, read_manifest_table, read_pipeline_document,
    DataStage, PipelineDocKind, PipelineSelector, QueryError,
};

/// Rows returned by `get_manifest` when the caller does not say otherwise.
const DEFAULT_MANIFEST_ROWS: usize = 100;

/// MCP server for one default dataset root.
///
/// Stores only the root path; every tool call re-reads configuration and
/// manifest state so concurrent calls share nothing mutable and each answer
/// reflects the dataset as it is at that moment.
#[derive(Debug, Clone)]
pub struct CohortMcpServer {
    default_root: PathBuf,
    tool_router: ToolRouter<Self>,
}

impl CohortMcpServer {
    /// Create a server whose calls default to the given dataset root.
    pub fn new(default_root: PathBuf) -> Self {
        Self {
            default_root,
            tool_router: Self::tool_router(),
        }
    }

    /// Per-call root: explicit parameter wins, then the server default
    /// (which the launcher already resolved through the environment chain).
    fn root_for(&self, param: Option<&str>) -> PathBuf {
        match param {
            Some(p) if !p.is_empty() => PathBuf::from(p),
            _ => self.default_root.clone(),
        }
    }
}

fn fail(e: QueryError) -> String {
    format!("[{}] {e}", e.kind())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("[serialization] {e}"))
}

// -- Tool parameter structs --

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DatasetInfoParams {
    /// Dataset root directory (default: the server's configured root)
    pub dataset_root: Option<String>,
    /// Include per-pipeline details (name, version, steps, file paths)
    pub include_pipeline_details: Option<bool>,
    /// Include per-stage matching counts across all manifest pairs
    pub include_status_summary: Option<bool>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ParticipantsSessionsParams {
    /// Dataset root directory (default: the server's configured root)
    pub dataset_root: Option<String>,
    /// Stage selector: all, imaging, downloaded, organized, bidsified, processed
    pub data_stage: String,
    /// Pipeline name (processed stage only; required when several are installed)
    pub pipeline_name: Option<String>,
    /// Pipeline version (processed stage only; default: highest installed)
    pub pipeline_version: Option<String>,
    /// Pipeline step (processed stage only; default: first declared step)
    pub pipeline_step: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct NavigateParams {
    /// Dataset root directory (default: the server's configured root)
    pub dataset_root: Option<String>,
    /// One of: dataset_root, directory, pipeline_config, pipeline_descriptor, pipeline_output
    pub path_type: String,
    /// Directory name for path_type=directory (sourcedata, organized, bids, derivatives, pipelines, tabular)
    pub target: Option<String>,
    /// Pipeline name for pipeline-scoped path types
    pub pipeline_name: Option<String>,
    /// Pipeline version (default: highest installed)
    pub pipeline_version: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RootOnlyParams {
    /// Dataset root directory (default: the server's configured root)
    pub dataset_root: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ManifestParams {
    /// Dataset root directory (default: the server's configured root)
    pub dataset_root: Option<String>,
    /// Maximum data rows to return (default: 100)
    pub max_rows: Option<usize>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListFilesParams {
    /// Dataset root directory (default: the server's configured root)
    pub dataset_root: Option<String>,
    /// Subdirectory relative to the dataset root (default: the root itself)
    pub subdirectory: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReadFileParams {
    /// Dataset root directory (default: the server's configured root)
    pub dataset_root: Option<String>,
    /// File path relative to the dataset root (e.g. "global_config.json")
    pub file_path: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PipelineDocParams {
    /// Dataset root directory (default: the server's configured root)
    pub dataset_root: Option<String>,
    /// Pipeline name (required when several pipelines are installed)
    pub pipeline_name: Option<String>,
    /// Pipeline version (default: highest installed)
    pub pipeline_version: Option<String>,
}

// -- Tool implementations --

#[tool_router]
impl CohortMcpServer {
    #[tool(
        description = "Get dataset metadata (name, description, version, participant and session counts), optionally with pipeline details and a per-stage status summary."
    )]
    fn get_dataset_info(
        &self,
        Parameters(params): Parameters<DatasetInfoParams>,
    ) -> Result<String, String> {
        let root = self.root_for(params.dataset_root.as_deref());
        let info = dataset_info(
            &root,
            params.include_pipeline_details.unwrap_or(false),
            params.include_status_summary.unwrap_or(false),
        )
        .map_err(fail)?;
        to_json(&info)
    }

    #[tool(
        description = "List participant-session pairs at a curation stage (all, imaging, downloaded, organized, bidsified, processed) with summary counts. The pipeline triple applies to data_stage=processed; name may be omitted only when a single pipeline is installed, version defaults to the highest installed, step to the first declared."
    )]
    fn get_participants_sessions(
        &self,
        Parameters(params): Parameters<ParticipantsSessionsParams>,
    ) -> Result<String, String> {
        let root = self.root_for(params.dataset_root.as_deref());
        let stage: DataStage = params.data_stage.parse().map_err(fail)?;
        let selector = PipelineSelector {
            name: params.pipeline_name,
            version: params.pipeline_version,
            step: params.pipeline_step,
        };
        let report = participants_sessions(&root, stage, &selector).map_err(fail)?;
        to_json(&report)
    }

    #[tool(
        description = "Resolve a logical dataset location (dataset_root, directory, pipeline_config, pipeline_descriptor, pipeline_output) to a concrete path and report whether it exists."
    )]
    fn navigate_dataset(
        &self,
        Parameters(params): Parameters<NavigateParams>,
    ) -> Result<String, String> {
        let root = self.root_for(params.dataset_root.as_deref());
        let path_type = PathType::parse(&params.path_type)
            .map_err(|e| fail(QueryError::Core(e)))?;
        let selector = PipelineSelector {
            name: params.pipeline_name,
            version: params.pipeline_version,
            step: None,
        };
        let result = navigate(&root, path_type, params.target.as_deref(), &selector)
            .map_err(fail)?;
        to_json(&result)
    }

    #[tool(description = "Read the raw dataset configuration document (global_config.json).")]
    fn get_config(&self, Parameters(params): Parameters<RootOnlyParams>) -> Result<String, String> {
        let root = self.root_for(params.dataset_root.as_deref());
        let value = read_config_document(&root).map_err(fail)?;
        to_json(&value)
    }

    #[tool(
        description = "Read the raw manifest table (manifest.tsv or manifest.csv), truncated to max_rows data rows."
    )]
    fn get_manifest(
        &self,
        Parameters(params): Parameters<ManifestParams>,
    ) -> Result<String, String> {
        let root = self.root_for(params.dataset_root.as_deref());
        let max_rows = params.max_rows.unwrap_or(DEFAULT_MANIFEST_ROWS);
        let table = read_manifest_table(&root, Some(max_rows)).map_err(fail)?;
        to_json(&table)
    }

    #[tool(
        description = "List installed processing pipelines from the dataset configuration: name, version, steps, and config/descriptor paths."
    )]
    fn list_pipelines(
        &self,
        Parameters(params): Parameters<RootOnlyParams>,
    ) -> Result<String, String> {
        let root = self.root_for(params.dataset_root.as_deref());
        layout::ensure_root(&root).map_err(|e| fail(e.into()))?;
        let config = cohort_core::DatasetConfig::load(&root).map_err(|e| fail(e.into()))?;
        to_json(&pipeline_details(&config))
    }

    #[tool(
        description = "List files and directories in one directory under the dataset root (no recursion). The subdirectory must stay within the dataset root."
    )]
    fn list_files(
        &self,
        Parameters(params): Parameters<ListFilesParams>,
    ) -> Result<String, String> {
        let root = self.root_for(params.dataset_root.as_deref());
        let listing = list_directory(&root, params.subdirectory.as_deref()).map_err(fail)?;
        to_json(&listing)
    }

    #[tool(
        description = "Read one file under the dataset root by relative path. JSON files are parsed; anything else is returned as text. Paths outside the root are rejected."
    )]
    fn read_file(
        &self,
        Parameters(params): Parameters<ReadFileParams>,
    ) -> Result<String, String> {
        let root = self.root_for(params.dataset_root.as_deref());
        let file = read_dataset_file(&root, &params.file_path).map_err(fail)?;
        to_json(&file)
    }

    #[tool(
        description = "Read a pipeline's configuration document. Version defaults to the highest installed for the name."
    )]
    fn get_pipeline_config(
        &self,
        Parameters(params): Parameters<PipelineDocParams>,
    ) -> Result<String, String> {
        self.pipeline_document(params, PipelineDocKind::Config)
    }

    #[tool(
        description = "Read a pipeline's descriptor document. Version defaults to the highest installed for the name."
    )]
    fn get_pipeline_descriptor(
        &self,
        Parameters(params): Parameters<PipelineDocParams>,
    ) -> Result<String, String> {
        self.pipeline_document(params, PipelineDocKind::Descriptor)
    }

    #[tool(
        description = "Deprecated: use get_participants_sessions with data_stage=\"bidsified\". Lists participant-session pairs present under the BIDS root."
    )]
    fn list_subjects(
        &self,
        Parameters(params): Parameters<RootOnlyParams>,
    ) -> Result<String, String> {
        let root = self.root_for(params.dataset_root.as_deref());
        compat::list_subjects(&root)
    }
}

impl CohortMcpServer {
    fn pipeline_document(
        &self,
        params: PipelineDocParams,
        kind: PipelineDocKind,
    ) -> Result<String, String> {
        let root = self.root_for(params.dataset_root.as_deref());
        let selector = PipelineSelector {
            name: params.pipeline_name,
            version: params.pipeline_version,
            step: None,
        };
        let doc = read_pipeline_document(&root, kind, &selector).map_err(fail)?;
        to_json(&doc)
    }
}

#[tool_handler]
impl ServerHandler for CohortMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Cohort MCP Server - Read-only introspection of a curated research dataset. \
                 Query participant-session status across curation stages, resolve pipeline \
                 identities, and read configuration, manifest, and pipeline documents."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            ..Default::default()
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        Ok(ListResourcesResult {
            resources: resources::list(&self.default_root),
            next_cursor: None,
            meta: None,
        })
    }

    async fn read_resource(
        &self,
        ReadResourceRequestParam { uri, .. }: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        resources::read(&self.default_root, &uri)
    }
}

/// Start the MCP server on stdio transport.
pub async fn run_stdio(default_root: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    use rmcp::transport::stdio;
    use rmcp::ServiceExt;

    tracing::info!(root = %default_root.display(), "starting MCP server on stdio");
    let server = CohortMcpServer::new(default_root);
    let service = server.serve(stdio()).await?;
    service.waiting().await?;
    Ok(())
}
