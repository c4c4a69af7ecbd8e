use image::RgbImage;
use indexmap::IndexSet;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::common::RgbColor;
use crate::config::{DegeneratePolicy, ExtractionConfig};
use crate::error::{AppError, Result};
use crate::pipeline::domain::color_analysis::{ColorCluster, DominantColors};
use crate::pipeline::services::image::kmeans::{self, KMeans, KMeansParams, Point};

/// Clusters an image's pixels into `k` dominant colors.
#[derive(Debug, Clone)]
pub struct ColorExtractor {
    config: ExtractionConfig,
}

impl ColorExtractor {
    pub fn new(config: ExtractionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub fn extract(&self, image: &RgbImage) -> Result<DominantColors> {
        let k = self.config.k;
        let pixels: Vec<RgbColor> = image.pixels().map(|px| RgbColor::from(*px)).collect();
        let total = pixels.len();

        if total < k {
            return Err(AppError::invalid(
                "k",
                format!("image has {total} pixels, fewer than k = {k}"),
            ));
        }

        // The seed drives both the sampling draw and the k-means restarts.
        let mut rng = StdRng::seed_from_u64(self.config.random_seed);
        let sample = self.sample(&pixels, &mut rng)?;
        let sampled = sample.is_some();
        let fit_set: &[RgbColor] = sample.as_deref().unwrap_or(&pixels);

        let distinct: IndexSet<RgbColor> = fit_set.iter().copied().collect();
        if distinct.len() < k {
            return self.degenerate(&pixels, distinct);
        }

        let points: Vec<Point> = fit_set.iter().map(|c| c.to_point()).collect();
        let fit = KMeans::new(KMeansParams {
            k,
            n_init: self.config.n_init,
            max_iterations: self.config.max_iterations,
            tolerance: self.config.tolerance,
        })
        .fit(&points, &mut rng);
        debug!(
            "Clustered {} points into {} colors (inertia {:.1})",
            points.len(),
            k,
            fit.inertia
        );

        let labels = if sampled {
            let all: Vec<Point> = pixels.iter().map(|c| c.to_point()).collect();
            kmeans::predict(&all, &fit.centers)
        } else {
            fit.labels
        };

        let centers = fit.centers.iter().map(|&p| RgbColor::from_point(p)).collect();
        Ok(rank(centers, &labels, total, k))
    }

    fn sample(&self, pixels: &[RgbColor], rng: &mut StdRng) -> Result<Option<Vec<RgbColor>>> {
        if self.config.sample_frac >= 1.0 {
            return Ok(None);
        }
        let amount = (pixels.len() as f64 * self.config.sample_frac).floor() as usize;
        if amount < self.config.k {
            return Err(AppError::invalid(
                "sample_frac",
                format!(
                    "sampling {} of {} pixels leaves fewer than k = {} points",
                    amount,
                    pixels.len(),
                    self.config.k
                ),
            ));
        }
        let indices = rand::seq::index::sample(rng, pixels.len(), amount);
        Ok(Some(indices.iter().map(|i| pixels[i]).collect()))
    }

    fn degenerate(&self, pixels: &[RgbColor], distinct: IndexSet<RgbColor>) -> Result<DominantColors> {
        let k = self.config.k;
        if self.config.degenerate == DegeneratePolicy::Reject {
            return Err(AppError::invalid(
                "k",
                format!("only {} distinct colors for k = {}", distinct.len(), k),
            ));
        }
        debug!(
            "Only {} distinct colors for k = {}, padding with empty clusters",
            distinct.len(),
            k
        );

        let centers: Vec<RgbColor> = distinct.into_iter().collect();
        let center_points: Vec<Point> = centers.iter().map(|c| c.to_point()).collect();
        let all: Vec<Point> = pixels.iter().map(|c| c.to_point()).collect();
        let labels = kmeans::predict(&all, &center_points);
        Ok(rank(centers, &labels, pixels.len(), k))
    }
}

/// Counts memberships, orders clusters by descending size and pads to `k`.
fn rank(centers: Vec<RgbColor>, labels: &[usize], total: usize, k: usize) -> DominantColors {
    let mut counts = vec![0usize; centers.len()];
    for &label in labels {
        counts[label] += 1;
    }

    let mut clusters: Vec<ColorCluster> = centers
        .into_iter()
        .zip(counts)
        .map(|(center, count)| ColorCluster::new(center, count, total))
        .collect();
    // Stable: equal counts keep cluster order.
    clusters.sort_by(|a, b| b.pixel_count().cmp(&a.pixel_count()));

    if let Some(dominant) = clusters.first().map(ColorCluster::center) {
        while clusters.len() < k {
            clusters.push(ColorCluster::new(dominant, 0, total));
        }
    }

    DominantColors::new(clusters, total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn extractor(k: usize) -> ColorExtractor {
        ColorExtractor::new(ExtractionConfig {
            k,
            ..ExtractionConfig::default()
        })
        .unwrap()
    }

    /// Left 60% red, right 40% blue.
    fn red_blue(width: u32, height: u32) -> RgbImage {
        let split = width * 3 / 5;
        ImageBuffer::from_fn(width, height, |x, _| {
            if x < split {
                Rgb([255, 0, 0])
            } else {
                Rgb([0, 0, 255])
            }
        })
    }

    fn gradient(width: u32, height: u32) -> RgbImage {
        ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x + y) * 3 % 256) as u8])
        })
    }

    fn assert_well_formed(colors: &DominantColors, k: usize) {
        assert_eq!(colors.len(), k);
        let sum: f64 = colors.clusters().iter().map(|c| c.fraction()).sum();
        assert!((sum - 1.0).abs() < 1e-6, "fractions sum to {sum}");
        for pair in colors.clusters().windows(2) {
            assert!(pair[0].fraction() >= pair[1].fraction());
        }
    }

    #[test]
    fn two_color_image_yields_exact_clusters() {
        let colors = extractor(2).extract(&red_blue(10, 10)).unwrap();
        assert_well_formed(&colors, 2);
        let clusters = colors.clusters();
        assert_eq!(clusters[0].center(), RgbColor::new(255, 0, 0));
        assert!((clusters[0].fraction() - 0.6).abs() < 1e-12);
        assert_eq!(clusters[1].center(), RgbColor::new(0, 0, 255));
        assert!((clusters[1].fraction() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn returns_k_sorted_clusters_for_busy_images() {
        for k in [1, 3, 5, 8] {
            let colors = extractor(k).extract(&gradient(40, 30)).unwrap();
            assert_well_formed(&colors, k);
        }
    }

    #[test]
    fn constant_image_pads_with_empty_clusters() {
        let img = ImageBuffer::from_pixel(12, 9, Rgb([17, 99, 201]));
        for k in 1..=4 {
            let colors = extractor(k).extract(&img).unwrap();
            assert_well_formed(&colors, k);
            assert_eq!(colors.clusters()[0].center(), RgbColor::new(17, 99, 201));
            assert_eq!(colors.clusters()[0].fraction(), 1.0);
            assert!(colors.clusters()[1..].iter().all(|c| c.fraction() == 0.0));
        }
    }

    #[test]
    fn reject_policy_refuses_degenerate_images() {
        let extractor = ColorExtractor::new(ExtractionConfig {
            k: 3,
            degenerate: DegeneratePolicy::Reject,
            ..ExtractionConfig::default()
        })
        .unwrap();
        let img = ImageBuffer::from_pixel(5, 5, Rgb([1, 1, 1]));
        let err = extractor.extract(&img).unwrap_err();
        assert!(matches!(err, AppError::InvalidParameter("k", _)));
    }

    #[test]
    fn fewer_pixels_than_k_is_invalid() {
        let img = ImageBuffer::from_pixel(2, 1, Rgb([1, 1, 1]));
        let err = extractor(3).extract(&img).unwrap_err();
        assert!(matches!(err, AppError::InvalidParameter("k", _)));
    }

    #[test]
    fn zero_k_is_rejected_up_front() {
        let err = ColorExtractor::new(ExtractionConfig {
            k: 0,
            ..ExtractionConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidParameter("k", _)));
    }

    #[test]
    fn sampling_still_counts_every_pixel() {
        let extractor = ColorExtractor::new(ExtractionConfig {
            k: 2,
            sample_frac: 0.3,
            ..ExtractionConfig::default()
        })
        .unwrap();
        let colors = extractor.extract(&red_blue(50, 20)).unwrap();
        assert_well_formed(&colors, 2);
        assert_eq!(colors.total_pixels(), 1000);
        assert_eq!(colors.clusters()[0].pixel_count(), 600);
        assert_eq!(colors.clusters()[1].pixel_count(), 400);
    }

    #[test]
    fn tiny_sample_is_invalid() {
        let extractor = ColorExtractor::new(ExtractionConfig {
            k: 5,
            sample_frac: 0.01,
            ..ExtractionConfig::default()
        })
        .unwrap();
        let err = extractor.extract(&gradient(10, 10)).unwrap_err();
        assert!(matches!(err, AppError::InvalidParameter("sample_frac", _)));
    }

    #[test]
    fn extraction_is_reproducible_with_sampling() {
        let config = ExtractionConfig {
            k: 4,
            sample_frac: 0.5,
            random_seed: 1234,
            ..ExtractionConfig::default()
        };
        let img = gradient(32, 32);
        let a = ColorExtractor::new(config.clone()).unwrap().extract(&img).unwrap();
        let b = ColorExtractor::new(config).unwrap().extract(&img).unwrap();
        assert_eq!(a, b);
    }
}
