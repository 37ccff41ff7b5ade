//! Error types for the raster engine.

use thiserror::Error;

/// Result type alias using GeoError.
pub type GeoResult<T> = Result<T, GeoError>;

/// Primary error type for raster, rendering and analysis operations.
#[derive(Debug, Error)]
pub enum GeoError {
    // === Request Errors ===
    #[error("Unsupported region: {0}")]
    UnsupportedRegion(String),

    #[error("Unsupported dataset: {0}")]
    UnsupportedDataset(String),

    #[error("Data for year {year} not found in dataset {dataset}")]
    MissingLayer { dataset: String, year: i32 },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // === Data Errors ===
    #[error("Layer dimensions do not match: {0}")]
    DimensionMismatch(String),

    #[error("No frames available: {0}")]
    NoFramesAvailable(String),

    #[error("Insufficient samples: need at least {required}, found {found}")]
    InsufficientSamples { required: usize, found: usize },

    #[error("Failed to decode raster: {0}")]
    Decode(String),

    #[error("Failed to encode output: {0}")]
    Encode(String),

    // === External Tool Errors ===
    #[error("Error in {tool}: {stderr}")]
    ExternalToolFailure {
        tool: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("Failed to run {tool}: {message}")]
    ToolSpawn { tool: String, message: String },

    #[error("{tool} did not produce {path}")]
    MissingOutput { tool: String, path: String },

    // === Infrastructure Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GeoError {
    /// Create a Decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create an Encode error.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Create an InvalidRequest error.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create a MissingLayer error.
    pub fn missing_layer(dataset: impl Into<String>, year: i32) -> Self {
        Self::MissingLayer {
            dataset: dataset.into(),
            year,
        }
    }

    /// Stable machine-readable code reported to the orchestration layer.
    pub fn code(&self) -> &'static str {
        match self {
            GeoError::UnsupportedRegion(_) => "UnsupportedRegion",
            GeoError::UnsupportedDataset(_) => "UnsupportedDataset",
            GeoError::MissingLayer { .. } => "MissingLayer",
            GeoError::InvalidRequest(_) => "InvalidRequest",
            GeoError::DimensionMismatch(_) => "DimensionMismatch",
            GeoError::NoFramesAvailable(_) => "NoFramesAvailable",
            GeoError::InsufficientSamples { .. } => "InsufficientSamples",
            GeoError::ExternalToolFailure { .. }
            | GeoError::ToolSpawn { .. }
            | GeoError::MissingOutput { .. } => "ExternalToolFailure",
            _ => "NoApplicableCode",
        }
    }

    /// True for failures scoped to one unit of work (one year, one dataset,
    /// one region) that a batch should record and move past.
    pub fn is_per_unit(&self) -> bool {
        !matches!(self, GeoError::Config(_) | GeoError::InvalidRequest(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            GeoError::UnsupportedRegion("mars".into()).code(),
            "UnsupportedRegion"
        );
        assert_eq!(GeoError::missing_layer("x", 2030).code(), "MissingLayer");
        let tool = GeoError::ExternalToolFailure {
            tool: "rio mbtiles".into(),
            status: Some(1),
            stderr: "bad input".into(),
        };
        assert_eq!(tool.code(), "ExternalToolFailure");
        assert_eq!(tool.to_string(), "Error in rio mbtiles: bad input");
    }

    #[test]
    fn test_missing_layer_message() {
        let err = GeoError::missing_layer("Climate_Precipitation_Data", 2030);
        assert_eq!(
            err.to_string(),
            "Data for year 2030 not found in dataset Climate_Precipitation_Data"
        );
    }

    #[test]
    fn test_io_conversion() {
        let err: GeoError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, GeoError::Io(_)));
        assert!(err.is_per_unit());
        assert!(!GeoError::Config("bad".into()).is_per_unit());
    }
}
