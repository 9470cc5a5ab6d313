//! Error taxonomy for analytics operations.

use thiserror::Error;

/// Result type for analytics operations.
pub type AnalyticsResult<T> = std::result::Result<T, AnalyticsError>;

/// Errors that can occur during analytics operations.
///
/// The first five variants are expected operational outcomes and are
/// recovered at the operation boundary; `CorruptArtifact` and `Storage`
/// are fatal to the single operation that hit them.
#[derive(Error, Debug)]
pub enum AnalyticsError {
    /// Requested date, region, or artifact does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed request parameter (bad date string, inverted range).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Artifact exists but yields zero valid pixels after masking.
    #[error("no data: {0}")]
    NoData(String),

    /// Baseline build found zero contributing years.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// Anomaly computation is missing the event or baseline raster.
    #[error("missing input: {0}")]
    MissingInput(String),

    /// Artifact file exists but cannot be decoded.
    #[error("corrupt artifact {path}: {message}")]
    CorruptArtifact { path: String, message: String },

    /// Storage/IO error.
    #[error("storage error: {0}")]
    Storage(String),

    /// The caller cancelled a long-running scan.
    #[error("operation cancelled")]
    Cancelled,
}

impl AnalyticsError {
    /// Create a NotFound error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an InvalidInput error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a NoData error.
    pub fn no_data(msg: impl Into<String>) -> Self {
        Self::NoData(msg.into())
    }

    /// Create a CorruptArtifact error.
    pub fn corrupt(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CorruptArtifact {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether this error means "the artifact simply is not there".
    ///
    /// Batched range scans use this to decide between skipping a date and
    /// aborting the whole operation.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<std::io::Error> for AnalyticsError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AnalyticsError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidInput(format!("JSON error: {}", err))
    }
}
