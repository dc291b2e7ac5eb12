//! Error types shared across Geoprojector crates.

use std::path::PathBuf;

/// Top-level error type for Geoprojector operations.
#[derive(Debug, thiserror::Error)]
pub enum GeoError {
    /// Invalid grid or step configuration. Raised before any point is processed.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A cell index outside the grid reached the buffer.
    #[error("Cell ({row}, {col}) is outside the {rows}x{cols} grid")]
    OutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    /// A point record failed parsing or validation.
    #[error("Malformed point at {index}: {message}")]
    MalformedPoint { index: usize, message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using GeoError.
pub type GeoResult<T> = Result<T, GeoError>;

impl GeoError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn malformed(index: usize, msg: impl Into<String>) -> Self {
        Self::MalformedPoint {
            index,
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    /// True for errors caused by bad input or configuration rather than I/O.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::Config { .. } | Self::MalformedPoint { .. } | Self::Json(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_bounds_message() {
        let err = GeoError::OutOfBounds {
            row: 3,
            col: 0,
            rows: 2,
            cols: 2,
        };
        assert_eq!(err.to_string(), "Cell (3, 0) is outside the 2x2 grid");
    }

    #[test]
    fn test_input_error_classification() {
        assert!(GeoError::config("rows must be >= 1").is_input_error());
        assert!(GeoError::malformed(4, "latitude out of range").is_input_error());
        assert!(!GeoError::render("encoder failed").is_input_error());
    }
}
