pub mod emotion;
pub mod image;
pub mod summary;
pub mod visualization;

pub use emotion::{DatasetLoader, EmotionMapper, ReferencePalette};
pub use self::image::ColorExtractor;
pub use summary::{SummaryRow, SummaryTable};
