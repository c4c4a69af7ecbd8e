pub mod color;
pub mod source_image;

pub use color::RgbColor;
pub use source_image::SourceImage;
