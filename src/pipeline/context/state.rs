use crate::pipeline::domain::color_analysis::DominantColors;

// Markers to track how far an image has travelled through the pipeline
pub struct LoadedState;

pub struct ExtractedState {
    pub(super) colors: DominantColors,
}

pub struct LabeledState {
    pub(super) colors: DominantColors,
    pub(super) emotions: Vec<String>,
}

pub trait ProcessingState: 'static {
    fn state_name() -> &'static str;
}

impl ProcessingState for LoadedState {
    fn state_name() -> &'static str {
        "Loaded"
    }
}

impl ProcessingState for ExtractedState {
    fn state_name() -> &'static str {
        "Extracted"
    }
}

impl ProcessingState for LabeledState {
    fn state_name() -> &'static str {
        "Labeled"
    }
}
