pub mod batch_report;
pub mod processing_pipeline;

pub use batch_report::{BatchReport, ImageAnalysis, ImageFailure, ImageInput};
pub use processing_pipeline::{ProcessingPipeline, ProcessingPipelineBuilder};
