use std::path::PathBuf;

/// Error types for the Toolshed library.
///
/// Most failures in the discovery pipeline are best-effort and never surface
/// here: unreadable directories, missing package managers and failed probes
/// all degrade to empty results. What remains are configuration problems and
/// failures at the output edge.
#[derive(Debug, thiserror::Error)]
pub enum ToolshedError {
    /// IO error occurred during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration file could not be parsed.
    #[error("invalid configuration in {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A configuration document (not backed by a file) could not be parsed.
    #[error("invalid configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Encoding or decoding JSON failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The requested output destination could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A package manager backend produced output that could not be understood.
    ///
    /// The `manager` field names the backend (e.g., "npm", "gem").
    #[error("{manager} backend failed: {message}")]
    Backend {
        manager: &'static str,
        message: String,
    },
}

/// Convenience Result type for Toolshed operations.
pub type Result<T> = std::result::Result<T, ToolshedError>;
