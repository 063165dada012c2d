use cohort_core::error::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error(
        "Invalid data stage: {0} (expected one of: all, imaging, downloaded, organized, bidsified, processed)"
    )]
    InvalidDataStage(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl QueryError {
    /// Stable machine-readable kind, for transports.
    pub fn kind(&self) -> &'static str {
        match self {
            QueryError::InvalidDataStage(_) => "invalid_parameter",
            QueryError::Core(e) => e.kind(),
        }
    }
}
