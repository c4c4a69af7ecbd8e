pub mod dataset_loader;
pub mod dataset_source;
pub mod emotion_mapper;
pub mod reference_palette;

pub use dataset_loader::{DatasetLoader, RawTable};
pub use dataset_source::{DatasetSource, HubDataset};
pub use emotion_mapper::EmotionMapper;
pub use reference_palette::{shared_or_load, ReferenceEntry, ReferencePalette};
