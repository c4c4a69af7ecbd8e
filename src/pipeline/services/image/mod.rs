pub mod color_extractor;
pub mod kmeans;

pub use color_extractor::ColorExtractor;
pub use kmeans::{KMeans, KMeansFit, KMeansParams};
