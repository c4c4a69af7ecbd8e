use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::common::SourceImage;
use crate::config::ExtractionConfig;
use crate::error::{AppError, Result};
use crate::pipeline::context::{ImageContext, LabeledState};
use crate::pipeline::orchestration::batch_report::{BatchReport, ImageAnalysis, ImageInput};
use crate::pipeline::services::emotion::{EmotionMapper, ReferencePalette};
use crate::pipeline::services::image::ColorExtractor;
use crate::pipeline::services::summary::summary_rows;

/// Runs images through extraction, labelling and summarising.
pub struct ProcessingPipeline {
    extractor: ColorExtractor,
    mapper: EmotionMapper,
}

impl ProcessingPipeline {
    pub fn builder() -> ProcessingPipelineBuilder {
        ProcessingPipelineBuilder::new()
    }

    pub fn extractor(&self) -> &ColorExtractor {
        &self.extractor
    }

    pub fn mapper(&self) -> &EmotionMapper {
        &self.mapper
    }

    pub fn load(&self, input: &ImageInput) -> Result<SourceImage> {
        let resize = self.extractor.config().resize_limit();
        match input {
            ImageInput::Path(path) => SourceImage::open(path, resize),
            ImageInput::Bytes { id, bytes } => SourceImage::from_bytes(id.clone(), bytes, resize),
        }
    }

    pub fn process_path(&self, path: &Path) -> Result<ImageAnalysis> {
        let source = self.load(&ImageInput::Path(path.to_path_buf()))?;
        self.process(source)
    }

    pub fn process(&self, source: SourceImage) -> Result<ImageAnalysis> {
        let context = ImageContext::new(source);
        debug!("Processing {} ({})", context.image_id(), context.state_name());

        let colors = self.extractor.extract(context.source().image())?;
        let context = context.into_extracted(colors);

        let emotions = self.mapper.map_all(context.colors().centers());
        let context = context.into_labeled(emotions)?;

        let analysis = Self::finish(context)?;
        debug!(
            "{}: extraction {:?}, labelling {:?}",
            analysis.image_id(),
            analysis.metrics().extraction_duration(),
            analysis.metrics().labeling_duration()
        );
        Ok(analysis)
    }

    fn finish(context: ImageContext<LabeledState>) -> Result<ImageAnalysis> {
        let rows = summary_rows(
            context.image_id(),
            context.colors().clusters(),
            context.emotions(),
        )?;
        Ok(ImageAnalysis {
            source: context.source().clone(),
            colors: context.colors().clone(),
            emotions: context.emotions().to_vec(),
            rows,
            metrics: context.metrics().clone(),
        })
    }

    /// Processes every input in order. Undecodable images are recorded and skipped;
    /// any other error stops the batch.
    pub fn process_batch<I>(&self, inputs: I) -> Result<BatchReport>
    where
        I: IntoIterator<Item = ImageInput>,
    {
        let mut report = BatchReport::default();

        for input in inputs {
            let outcome = self.load(&input).and_then(|source| self.process(source));
            match outcome {
                Ok(analysis) => {
                    info!(
                        "Processed {}: {} colors",
                        analysis.image_id(),
                        analysis.colors().len()
                    );
                    report.record(analysis);
                }
                Err(e) if e.is_per_image() => {
                    error!("Skipping {}: {}", input.label(), e);
                    report.record_failure(input.id(), e);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(report)
    }
}

pub struct ProcessingPipelineBuilder {
    extraction: ExtractionConfig,
    palette: Option<Arc<ReferencePalette>>,
}

impl ProcessingPipelineBuilder {
    pub fn new() -> Self {
        Self {
            extraction: ExtractionConfig::default(),
            palette: None,
        }
    }

    pub fn extraction(mut self, extraction: ExtractionConfig) -> Self {
        self.extraction = extraction;
        self
    }

    pub fn palette(mut self, palette: Arc<ReferencePalette>) -> Self {
        self.palette = Some(palette);
        self
    }

    pub fn build(self) -> Result<ProcessingPipeline> {
        let palette = self
            .palette
            .ok_or_else(|| AppError::invalid("palette", "reference palette not set"))?;
        Ok(ProcessingPipeline {
            extractor: ColorExtractor::new(self.extraction)?,
            mapper: EmotionMapper::new(palette),
        })
    }
}

impl Default for ProcessingPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
