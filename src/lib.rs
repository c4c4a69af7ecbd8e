pub mod common;
pub mod config;
pub mod error;
pub mod pipeline;

pub use common::{RgbColor, SourceImage};
pub use config::{Configuration, ConfigurationBuilder, DegeneratePolicy, ExtractionConfig};
pub use error::{AppError, DataLoadError, ExportError, Result};

pub use pipeline::services::emotion::{DatasetLoader, EmotionMapper, ReferenceEntry, ReferencePalette};
pub use pipeline::services::summary::{SummaryRow, SummaryTable};
pub use pipeline::{BatchReport, ColorCluster, DominantColors, ImageAnalysis, ImageInput, ProcessingPipeline};
