use crate::common::RgbColor;

/// One representative color and the share of the image's pixels assigned to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorCluster {
    center: RgbColor,
    fraction: f64,
    pixel_count: usize,
}

impl ColorCluster {
    pub fn new(center: RgbColor, pixel_count: usize, total_pixels: usize) -> Self {
        let fraction = if total_pixels == 0 {
            0.0
        } else {
            pixel_count as f64 / total_pixels as f64
        };
        Self {
            center,
            fraction,
            pixel_count,
        }
    }

    /// Fixture helper; the pixel count is left at zero.
    #[cfg(test)]
    pub(crate) fn with_fraction(center: RgbColor, fraction: f64) -> Self {
        Self {
            center,
            fraction,
            pixel_count: 0,
        }
    }

    pub fn center(&self) -> RgbColor {
        self.center
    }

    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    pub fn pixel_count(&self) -> usize {
        self.pixel_count
    }

    pub fn hex(&self) -> String {
        self.center.to_hex()
    }
}

/// Dominant colors of one image, largest cluster first.
#[derive(Debug, Clone, PartialEq)]
pub struct DominantColors {
    clusters: Vec<ColorCluster>,
    total_pixels: usize,
}

impl DominantColors {
    pub fn new(clusters: Vec<ColorCluster>, total_pixels: usize) -> Self {
        Self {
            clusters,
            total_pixels,
        }
    }

    pub fn clusters(&self) -> &[ColorCluster] {
        &self.clusters
    }

    pub fn centers(&self) -> impl Iterator<Item = RgbColor> + '_ {
        self.clusters.iter().map(ColorCluster::center)
    }

    pub fn total_pixels(&self) -> usize {
        self.total_pixels
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }
}
