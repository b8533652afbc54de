use canvas::config::ConfigError;
use canvas::error::ErrorCode;
use canvas::raster::RasterError;
use canvas::snapshot::SnapshotError;

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Raster(#[from] RasterError),
    #[error("invalid roadmap: {0}")]
    Roadmap(serde_json::Error),
    #[error("failed to encode output: {0}")]
    Output(serde_json::Error),
    #[error("viewport size must be positive, got {width}x{height}")]
    ViewportSize { width: f64, height: f64 },
}

impl ErrorCode for ToolError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Read { .. } => "E_TOOL_READ",
            Self::Write { .. } => "E_TOOL_WRITE",
            Self::Config(e) => e.error_code(),
            Self::Snapshot(e) => e.error_code(),
            Self::Raster(e) => e.error_code(),
            Self::Roadmap(_) => "E_TOOL_ROADMAP",
            Self::Output(_) => "E_TOOL_OUTPUT",
            Self::ViewportSize { .. } => "E_TOOL_VIEWPORT_SIZE",
        }
    }
}
