use indexmap::IndexMap;
use std::path::PathBuf;

use crate::common::source_image::image_id;
use crate::common::SourceImage;
use crate::error::AppError;
use crate::pipeline::context::ImageMetrics;
use crate::pipeline::domain::color_analysis::DominantColors;
use crate::pipeline::services::summary::{SummaryRow, SummaryTable};
use crate::pipeline::services::visualization::{self, EmotionTotals, RgbHistogram};

/// Where an image comes from.
#[derive(Debug, Clone)]
pub enum ImageInput {
    Path(PathBuf),
    Bytes { id: String, bytes: Vec<u8> },
}

impl ImageInput {
    /// Same identifier the summary rows use.
    pub fn id(&self) -> String {
        match self {
            ImageInput::Path(path) => image_id(path),
            ImageInput::Bytes { id, .. } => id.clone(),
        }
    }

    pub fn label(&self) -> String {
        match self {
            ImageInput::Path(path) => path.display().to_string(),
            ImageInput::Bytes { id, .. } => id.clone(),
        }
    }
}

impl From<PathBuf> for ImageInput {
    fn from(path: PathBuf) -> Self {
        ImageInput::Path(path)
    }
}

/// Everything learned about one image.
#[derive(Clone)]
pub struct ImageAnalysis {
    pub(crate) source: SourceImage,
    pub(crate) colors: DominantColors,
    pub(crate) emotions: Vec<String>,
    pub(crate) rows: Vec<SummaryRow>,
    pub(crate) metrics: ImageMetrics,
}

impl ImageAnalysis {
    pub fn image_id(&self) -> &str {
        self.source.id()
    }

    pub fn source(&self) -> &SourceImage {
        &self.source
    }

    pub fn colors(&self) -> &DominantColors {
        &self.colors
    }

    pub fn emotions(&self) -> &[String] {
        &self.emotions
    }

    pub fn rows(&self) -> &[SummaryRow] {
        &self.rows
    }

    pub fn metrics(&self) -> &ImageMetrics {
        &self.metrics
    }

    pub fn emotion_distribution(&self) -> IndexMap<String, f64> {
        visualization::emotion_distribution(self.colors.clusters(), &self.emotions)
    }

    pub fn color_legend(&self) -> IndexMap<String, String> {
        visualization::color_legend(self.colors.clusters(), &self.emotions)
    }

    pub fn histogram(&self) -> RgbHistogram {
        RgbHistogram::from_image(self.source.image())
    }
}

#[derive(Debug)]
pub struct ImageFailure {
    pub image: String,
    pub error: AppError,
}

/// Outcome of a batch run: rows for every image that succeeded and the images that did not.
#[derive(Default)]
pub struct BatchReport {
    pub(crate) table: SummaryTable,
    pub(crate) analyses: Vec<ImageAnalysis>,
    pub(crate) failures: Vec<ImageFailure>,
}

impl BatchReport {
    pub fn table(&self) -> &SummaryTable {
        &self.table
    }

    pub fn analyses(&self) -> &[ImageAnalysis] {
        &self.analyses
    }

    pub fn failures(&self) -> &[ImageFailure] {
        &self.failures
    }

    /// True when no input produced an analysis, including an empty batch.
    pub fn all_failed(&self) -> bool {
        self.analyses.is_empty()
    }

    pub fn emotion_totals(&self) -> EmotionTotals {
        EmotionTotals::from_rows(self.table.rows())
    }

    pub(crate) fn record(&mut self, analysis: ImageAnalysis) {
        self.table.extend(analysis.rows.iter().cloned());
        self.analyses.push(analysis);
    }

    pub(crate) fn record_failure(&mut self, image: String, error: AppError) {
        self.failures.push(ImageFailure { image, error });
    }
}
