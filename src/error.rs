use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid parameter {0}: {1}")]
    InvalidParameter(&'static str, String),
    #[error("Failed to load reference palette: {0}")]
    DataLoad(#[from] DataLoadError),
    #[error("Failed to decode image {0}: {1}")]
    Decode(String, #[source] image::ImageError),
    #[error("Export Error: {0}")]
    Export(#[from] ExportError),
    #[error("Configuration Error: {0}")]
    Config(#[from] config::ConfigError),
}

impl AppError {
    pub fn invalid(parameter: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter(parameter, reason.into())
    }

    /// Errors that only affect a single image and must not stop a batch.
    pub fn is_per_image(&self) -> bool {
        matches!(self, AppError::Decode(..))
    }
}

// Reference Palette Error Type
#[derive(Error, Debug)]
pub enum DataLoadError {
    #[error("Failed to read dataset {1}: {0}")]
    ReadError(std::io::Error, PathBuf),
    #[error("Failed to fetch dataset {0}: {1}")]
    FetchError(String, String),
    #[error("Failed to parse dataset {1}: {0}")]
    ParseError(String, PathBuf),
    #[error("Unsupported dataset format: {0}")]
    UnsupportedFormat(PathBuf),
    #[error("No hex/color column found in dataset (columns: {0:?})")]
    NoHexColumn(Vec<String>),
    #[error("No emotion/tag column found in dataset (columns: {0:?})")]
    NoEmotionColumn(Vec<String>),
    #[error("Configured column {0:?} is not present in dataset")]
    MissingColumn(String),
    #[error("Dataset has no rows with a valid hex color")]
    Empty,
}

// Export Error Type
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to create output directory {1}: {0}")]
    CreateDirError(std::io::Error, PathBuf),
    #[error("Failed to write {1}: {0}")]
    WriteError(csv::Error, PathBuf),
    #[error("Failed to flush {1}: {0}")]
    FlushError(std::io::Error, PathBuf),
    #[error("Failed to save image {1}: {0}")]
    ImageError(image::ImageError, PathBuf),
}
