use std::sync::Arc;

use crate::common::RgbColor;
use crate::error::Result;
use crate::pipeline::services::emotion::reference_palette::ReferencePalette;

/// Labels colors with the emotion of their nearest reference entry.
#[derive(Debug, Clone)]
pub struct EmotionMapper {
    palette: Arc<ReferencePalette>,
}

impl EmotionMapper {
    pub fn new(palette: Arc<ReferencePalette>) -> Self {
        Self { palette }
    }

    pub fn palette(&self) -> &ReferencePalette {
        &self.palette
    }

    pub fn map(&self, color: RgbColor) -> &str {
        self.palette.nearest(color).emotion()
    }

    pub fn map_all<I>(&self, colors: I) -> Vec<String>
    where
        I: IntoIterator<Item = RgbColor>,
    {
        colors
            .into_iter()
            .map(|color| self.map(color).to_string())
            .collect()
    }

    pub fn map_hex(&self, hex: &str) -> Result<&str> {
        let color: RgbColor = hex.parse()?;
        Ok(self.map(color))
    }
}
