pub mod image_context;
pub mod metrics;
pub mod state;

pub use image_context::ImageContext;
pub use metrics::ImageMetrics;
pub use state::{ExtractedState, LabeledState, LoadedState, ProcessingState};
