use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{AppError, Result};
use crate::pipeline::domain::color_analysis::ColorCluster;
use crate::pipeline::services::summary::export;

pub const SUMMARY_HEADER: [&str; 8] = ["image", "rank", "r", "g", "b", "hex", "fraction", "emotion"];

/// One exported line: a single dominant color of a single image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub image: String,
    pub rank: usize,
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub hex: String,
    pub fraction: f64,
    pub emotion: String,
}

/// Builds ranked rows for one image from parallel cluster and emotion sequences.
pub fn summary_rows(
    image: &str,
    clusters: &[ColorCluster],
    emotions: &[String],
) -> Result<Vec<SummaryRow>> {
    if clusters.len() != emotions.len() {
        return Err(AppError::invalid(
            "emotions",
            format!(
                "{} clusters but {} emotion labels",
                clusters.len(),
                emotions.len()
            ),
        ));
    }

    Ok(clusters
        .iter()
        .zip(emotions)
        .enumerate()
        .map(|(i, (cluster, emotion))| {
            let center = cluster.center();
            SummaryRow {
                image: image.to_string(),
                rank: i + 1,
                r: center.r,
                g: center.g,
                b: center.b,
                hex: center.to_hex(),
                fraction: cluster.fraction(),
                emotion: emotion.clone(),
            }
        })
        .collect())
}

/// Rows collected across every processed image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryTable {
    rows: Vec<SummaryRow>,
}

impl SummaryTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_image(
        &mut self,
        image: &str,
        clusters: &[ColorCluster],
        emotions: &[String],
    ) -> Result<()> {
        let rows = summary_rows(image, clusters, emotions)?;
        self.rows.extend(rows);
        Ok(())
    }

    pub fn extend(&mut self, rows: impl IntoIterator<Item = SummaryRow>) {
        self.rows.extend(rows);
    }

    pub fn rows(&self) -> &[SummaryRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        export::write_csv(path, &SUMMARY_HEADER, self.rows.as_slice())?;
        Ok(())
    }
}
