use image::{Rgb, RgbImage};
use indexmap::IndexMap;
use serde::Serialize;
use std::path::Path;

use crate::error::Result;
use crate::pipeline::domain::color_analysis::ColorCluster;
use crate::pipeline::services::summary::{export, SummaryRow};

pub const TOTALS_HEADER: [&str; 3] = ["image", "emotion", "fraction"];

/// Summed fraction per emotion, in the order emotions first appear.
pub fn emotion_distribution(clusters: &[ColorCluster], emotions: &[String]) -> IndexMap<String, f64> {
    let mut distribution = IndexMap::new();
    for (cluster, emotion) in clusters.iter().zip(emotions) {
        *distribution.entry(emotion.clone()).or_insert(0.0) += cluster.fraction();
    }
    distribution
}

/// Display color for each emotion: the hex of the last cluster labelled with it.
pub fn color_legend(clusters: &[ColorCluster], emotions: &[String]) -> IndexMap<String, String> {
    let mut legend = IndexMap::new();
    for (cluster, emotion) in clusters.iter().zip(emotions) {
        legend.insert(emotion.clone(), cluster.hex());
    }
    legend
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmotionTotal {
    pub image: String,
    pub emotion: String,
    pub fraction: f64,
}

/// Per-image emotion totals across a whole batch.
#[derive(Debug, Clone, Default)]
pub struct EmotionTotals {
    totals: IndexMap<(String, String), f64>,
}

impl EmotionTotals {
    pub fn from_rows(rows: &[SummaryRow]) -> Self {
        let mut totals = IndexMap::new();
        for row in rows {
            *totals
                .entry((row.image.clone(), row.emotion.clone()))
                .or_insert(0.0) += row.fraction;
        }
        Self { totals }
    }

    pub fn get(&self, image: &str, emotion: &str) -> Option<f64> {
        self.totals
            .get(&(image.to_string(), emotion.to_string()))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    pub fn rows(&self) -> Vec<EmotionTotal> {
        self.totals
            .iter()
            .map(|((image, emotion), fraction)| EmotionTotal {
                image: image.clone(),
                emotion: emotion.clone(),
                fraction: *fraction,
            })
            .collect()
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        export::write_csv(path, &TOTALS_HEADER, self.rows().as_slice())?;
        Ok(())
    }
}

/// Per-channel intensity counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbHistogram {
    pub red: [u32; 256],
    pub green: [u32; 256],
    pub blue: [u32; 256],
}

impl RgbHistogram {
    pub fn from_image(image: &RgbImage) -> Self {
        let mut histogram = Self {
            red: [0; 256],
            green: [0; 256],
            blue: [0; 256],
        };
        for px in image.pixels() {
            histogram.red[px[0] as usize] += 1;
            histogram.green[px[1] as usize] += 1;
            histogram.blue[px[2] as usize] += 1;
        }
        histogram
    }

    pub fn total(&self) -> u64 {
        self.red.iter().map(|&c| c as u64).sum()
    }
}

/// Horizontal bands, one per cluster, each as wide as its share of the image.
pub fn render_color_strip(clusters: &[ColorCluster], width: u32, height: u32) -> RgbImage {
    let mut strip = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
    let mut cumulative = 0.0;
    let mut left = 0u32;

    for (i, cluster) in clusters.iter().enumerate() {
        cumulative += cluster.fraction();
        let right = if i + 1 == clusters.len() {
            width
        } else {
            ((cumulative * width as f64).round() as u32).min(width)
        };
        let color: Rgb<u8> = cluster.center().into();
        for x in left..right {
            for y in 0..height {
                strip.put_pixel(x, y, color);
            }
        }
        left = left.max(right);
    }
    strip
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::RgbColor;
    use image::ImageBuffer;

    fn clusters() -> Vec<ColorCluster> {
        vec![
            ColorCluster::with_fraction(RgbColor::new(255, 0, 0), 0.5),
            ColorCluster::with_fraction(RgbColor::new(0, 0, 255), 0.3),
            ColorCluster::with_fraction(RgbColor::new(200, 0, 0), 0.2),
        ]
    }

    fn emotions() -> Vec<String> {
        ["Passion", "Calm", "Passion"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn distribution_sums_repeated_emotions() {
        let distribution = emotion_distribution(&clusters(), &emotions());
        assert_eq!(distribution.len(), 2);
        assert!((distribution["Passion"] - 0.7).abs() < 1e-12);
        assert_eq!(distribution.get_index(1).map(|(k, _)| k.as_str()), Some("Calm"));
    }

    #[test]
    fn legend_uses_last_cluster_per_emotion() {
        let legend = color_legend(&clusters(), &emotions());
        assert_eq!(legend["Passion"], "#c80000");
        assert_eq!(legend["Calm"], "#0000ff");
    }

    #[test]
    fn totals_group_by_image_and_emotion() {
        let rows = vec![
            row("a.png", "Passion", 0.5),
            row("a.png", "Calm", 0.3),
            row("a.png", "Passion", 0.2),
            row("b.png", "Calm", 1.0),
        ];
        let totals = EmotionTotals::from_rows(&rows);
        assert_eq!(totals.len(), 3);
        assert!((totals.get("a.png", "Passion").unwrap() - 0.7).abs() < 1e-12);
        assert_eq!(totals.get("b.png", "Calm"), Some(1.0));
        assert_eq!(totals.get("b.png", "Passion"), None);
    }

    #[test]
    fn histogram_counts_each_channel() {
        let img = ImageBuffer::from_pixel(4, 2, Rgb([10, 20, 30]));
        let histogram = RgbHistogram::from_image(&img);
        assert_eq!(histogram.red[10], 8);
        assert_eq!(histogram.green[20], 8);
        assert_eq!(histogram.blue[30], 8);
        assert_eq!(histogram.total(), 8);
    }

    #[test]
    fn strip_spans_follow_fractions() {
        let strip = render_color_strip(&clusters(), 100, 4);
        assert_eq!(strip.dimensions(), (100, 4));
        assert_eq!(*strip.get_pixel(0, 0), Rgb([255, 0, 0]));
        assert_eq!(*strip.get_pixel(49, 3), Rgb([255, 0, 0]));
        assert_eq!(*strip.get_pixel(50, 0), Rgb([0, 0, 255]));
        assert_eq!(*strip.get_pixel(79, 0), Rgb([0, 0, 255]));
        assert_eq!(*strip.get_pixel(80, 0), Rgb([200, 0, 0]));
        assert_eq!(*strip.get_pixel(99, 0), Rgb([200, 0, 0]));
    }

    fn row(image: &str, emotion: &str, fraction: f64) -> SummaryRow {
        SummaryRow {
            image: image.to_string(),
            rank: 1,
            r: 0,
            g: 0,
            b: 0,
            hex: "#000000".to_string(),
            fraction,
            emotion: emotion.to_string(),
        }
    }
}
