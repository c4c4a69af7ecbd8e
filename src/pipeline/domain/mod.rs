pub mod color_analysis;

pub use color_analysis::{ColorCluster, DominantColors};
