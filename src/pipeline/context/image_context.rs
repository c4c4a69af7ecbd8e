use std::time::{Duration, Instant};

use crate::common::SourceImage;
use crate::error::{AppError, Result};
use crate::pipeline::context::metrics::ImageMetrics;
use crate::pipeline::context::state::{ExtractedState, LabeledState, LoadedState, ProcessingState};
use crate::pipeline::domain::color_analysis::DominantColors;

// ImageContext with compile-time tracking of the processing stage
pub struct ImageContext<S> {
    source: SourceImage,
    metrics: ImageMetrics,
    processing_start: Instant,
    stage_start: Instant,
    state: S,
}

impl<S> ImageContext<S> {
    pub fn source(&self) -> &SourceImage {
        &self.source
    }

    pub fn image_id(&self) -> &str {
        self.source.id()
    }

    pub fn metrics(&self) -> &ImageMetrics {
        &self.metrics
    }

    pub fn elapsed(&self) -> Duration {
        self.processing_start.elapsed()
    }

    fn advance<T>(self, metrics: ImageMetrics, state: T) -> ImageContext<T> {
        ImageContext {
            source: self.source,
            metrics,
            processing_start: self.processing_start,
            stage_start: Instant::now(),
            state,
        }
    }
}

impl<S: ProcessingState> ImageContext<S> {
    pub fn state_name(&self) -> &'static str {
        S::state_name()
    }
}

impl ImageContext<LoadedState> {
    pub fn new(source: SourceImage) -> Self {
        let now = Instant::now();
        Self {
            source,
            metrics: ImageMetrics::new(),
            processing_start: now,
            stage_start: now,
            state: LoadedState,
        }
    }

    pub fn into_extracted(self, colors: DominantColors) -> ImageContext<ExtractedState> {
        let mut metrics = self.metrics.clone();
        metrics.record_extraction_duration(self.stage_start.elapsed());
        self.advance(metrics, ExtractedState { colors })
    }
}

impl ImageContext<ExtractedState> {
    pub fn colors(&self) -> &DominantColors {
        &self.state.colors
    }

    /// Attaches one emotion label per cluster, in cluster order.
    pub fn into_labeled(self, emotions: Vec<String>) -> Result<ImageContext<LabeledState>> {
        if emotions.len() != self.state.colors.len() {
            return Err(AppError::invalid(
                "emotions",
                format!(
                    "{} labels for {} clusters",
                    emotions.len(),
                    self.state.colors.len()
                ),
            ));
        }
        let mut metrics = self.metrics.clone();
        metrics.record_labeling_duration(self.stage_start.elapsed());
        let colors = self.state.colors.clone();
        Ok(self.advance(metrics, LabeledState { colors, emotions }))
    }
}

impl ImageContext<LabeledState> {
    pub fn colors(&self) -> &DominantColors {
        &self.state.colors
    }

    pub fn emotions(&self) -> &[String] {
        &self.state.emotions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::RgbColor;
    use crate::pipeline::domain::color_analysis::ColorCluster;
    use image::{ImageBuffer, Rgb};

    fn context() -> ImageContext<LoadedState> {
        ImageContext::new(SourceImage::new(
            "a.png",
            ImageBuffer::from_pixel(4, 4, Rgb([255, 0, 0])),
        ))
    }

    fn colors() -> DominantColors {
        DominantColors::new(vec![ColorCluster::new(RgbColor::new(255, 0, 0), 16, 16)], 16)
    }

    #[test]
    fn stages_record_their_durations() {
        let ctx = context();
        assert_eq!(ctx.state_name(), "Loaded");

        let ctx = ctx.into_extracted(colors());
        assert_eq!(ctx.state_name(), "Extracted");
        assert!(ctx.metrics().extraction_duration().is_some());

        let ctx = ctx.into_labeled(vec!["Passion".to_string()]).unwrap();
        assert_eq!(ctx.state_name(), "Labeled");
        assert_eq!(ctx.image_id(), "a.png");
        assert_eq!(ctx.emotions(), ["Passion".to_string()]);
        assert!(ctx.metrics().labeling_duration().is_some());
    }

    #[test]
    fn label_count_must_match_clusters() {
        let err = context()
            .into_extracted(colors())
            .into_labeled(Vec::new())
            .err()
            .unwrap();
        assert!(matches!(err, AppError::InvalidParameter("emotions", _)));
    }
}
