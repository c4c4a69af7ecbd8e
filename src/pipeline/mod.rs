pub mod context;
pub mod domain;
pub mod orchestration;
pub mod services;

pub use domain::{ColorCluster, DominantColors};
pub use orchestration::{BatchReport, ImageAnalysis, ImageInput, ProcessingPipeline};
