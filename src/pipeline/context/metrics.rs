use std::time::Duration;

/// Stage timings for one image
#[derive(Debug, Clone, Default)]
pub struct ImageMetrics {
    extraction_duration: Option<Duration>,
    labeling_duration: Option<Duration>,
}

impl ImageMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_extraction_duration(&mut self, duration: Duration) {
        self.extraction_duration = Some(duration);
    }

    pub fn record_labeling_duration(&mut self, duration: Duration) {
        self.labeling_duration = Some(duration);
    }

    pub fn extraction_duration(&self) -> Option<Duration> {
        self.extraction_duration
    }

    pub fn labeling_duration(&self) -> Option<Duration> {
        self.labeling_duration
    }
}
