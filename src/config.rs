use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::pipeline::services::emotion::dataset_source::MAX_PAGE_SIZE;

pub const ENV_PREFIX: &str = "COLOR_MOOD";
pub const DEFAULT_CONFIG_FILE: &str = "color-mood.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub extraction: ExtractionConfig,
    pub palette: PaletteConfig,
    pub output: OutputConfig,
}

/// Tunables for dominant color extraction.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub k: usize,
    /// Longer-side pixel cap applied when decoding; 0 disables resizing.
    pub resize_max: u32,
    pub sample_frac: f64,
    pub random_seed: u64,
    pub n_init: usize,
    pub max_iterations: usize,
    pub tolerance: f64,
    pub degenerate: DegeneratePolicy,
}

/// What to do when an image has fewer distinct colors than requested clusters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DegeneratePolicy {
    /// Report each distinct color and pad the rest with zero-fraction clusters.
    Pad,
    /// Fail with an invalid parameter error.
    Reject,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaletteConfig {
    /// Local dataset file; when set it replaces the download.
    pub path: Option<PathBuf>,
    pub dataset: String,
    pub dataset_config: String,
    pub split: String,
    pub rows_endpoint: String,
    pub page_size: usize,
    pub timeout_secs: u64,
    /// Exact column names; detected from the header when absent.
    pub hex_column: Option<String>,
    pub emotion_column: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub summary_file: String,
    pub totals_file: String,
    pub render_strips: bool,
    pub strip_width: u32,
    pub strip_height: u32,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            extraction: ExtractionConfig::default(),
            palette: PaletteConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            k: 5,
            resize_max: 800,
            sample_frac: 1.0,
            random_seed: 42,
            n_init: 10,
            max_iterations: 300,
            tolerance: 1e-4,
            degenerate: DegeneratePolicy::Pad,
        }
    }
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            path: None,
            dataset: "boltuix/color-pedia".to_string(),
            dataset_config: "default".to_string(),
            split: "train".to_string(),
            rows_endpoint: "https://datasets-server.huggingface.co/rows".to_string(),
            page_size: 100,
            timeout_secs: 30,
            hex_column: None,
            emotion_column: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data/output"),
            summary_file: "summary.csv".to_string(),
            totals_file: "emotion_totals.csv".to_string(),
            render_strips: false,
            strip_width: 600,
            strip_height: 120,
        }
    }
}

impl Configuration {
    /// Layers the defaults, an optional config file and `COLOR_MOOD_*` environment variables.
    ///
    /// An explicitly given file must exist; the default `color-mood.toml` is optional.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let file_source = match file {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let configuration: Configuration = config::Config::builder()
            .add_source(file_source)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        configuration.validate()?;
        Ok(configuration)
    }

    pub fn validate(&self) -> Result<()> {
        self.extraction.validate()?;
        self.palette.validate()
    }

    pub fn summary_path(&self) -> PathBuf {
        self.output.dir.join(&self.output.summary_file)
    }

    pub fn totals_path(&self) -> PathBuf {
        self.output.dir.join(&self.output.totals_file)
    }
}

impl ExtractionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(AppError::invalid("k", "must be at least 1"));
        }

        if !(self.sample_frac > 0.0 && self.sample_frac <= 1.0) {
            return Err(AppError::invalid(
                "sample_frac",
                format!("{} is outside (0, 1]", self.sample_frac),
            ));
        }

        if self.n_init == 0 {
            return Err(AppError::invalid("n_init", "must be at least 1"));
        }

        if self.max_iterations == 0 {
            return Err(AppError::invalid("max_iterations", "must be at least 1"));
        }

        if !(self.tolerance >= 0.0) {
            return Err(AppError::invalid(
                "tolerance",
                format!("{} must be non-negative", self.tolerance),
            ));
        }

        Ok(())
    }

    /// `None` when resizing is disabled.
    pub fn resize_limit(&self) -> Option<u32> {
        (self.resize_max > 0).then_some(self.resize_max)
    }
}

impl PaletteConfig {
    pub fn validate(&self) -> Result<()> {
        if self.path.is_none() && self.dataset.trim().is_empty() {
            return Err(AppError::invalid("dataset", "no dataset name and no local path"));
        }

        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(AppError::invalid(
                "page_size",
                format!("{} is outside 1..={}", self.page_size, MAX_PAGE_SIZE),
            ));
        }

        Ok(())
    }
}

/// Applies command line overrides on top of a loaded configuration.
pub struct ConfigurationBuilder {
    configuration: Configuration,
}

impl ConfigurationBuilder {
    pub fn new(configuration: Configuration) -> Self {
        Self { configuration }
    }

    // Sets the number of dominant colors, this will override the loaded configuration.
    pub fn k(mut self, k: usize) -> Self {
        self.configuration.extraction.k = k;
        self
    }

    pub fn resize_max(mut self, resize_max: u32) -> Self {
        self.configuration.extraction.resize_max = resize_max;
        self
    }

    pub fn sample_frac(mut self, sample_frac: f64) -> Self {
        self.configuration.extraction.sample_frac = sample_frac;
        self
    }

    pub fn random_seed(mut self, seed: u64) -> Self {
        self.configuration.extraction.random_seed = seed;
        self
    }

    pub fn palette_path(mut self, path: PathBuf) -> Self {
        self.configuration.palette.path = Some(path);
        self
    }

    pub fn dataset(mut self, name: String) -> Self {
        self.configuration.palette.dataset = name;
        self
    }

    pub fn hex_column(mut self, column: String) -> Self {
        self.configuration.palette.hex_column = Some(column);
        self
    }

    pub fn emotion_column(mut self, column: String) -> Self {
        self.configuration.palette.emotion_column = Some(column);
        self
    }

    pub fn output_dir(mut self, dir: PathBuf) -> Self {
        self.configuration.output.dir = dir;
        self
    }

    pub fn render_strips(mut self, render: bool) -> Self {
        self.configuration.output.render_strips = render;
        self
    }

    pub fn build(self) -> Result<Configuration> {
        self.configuration.validate()?;
        Ok(self.configuration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let configuration = Configuration::default();
        assert!(configuration.validate().is_ok());
        assert_eq!(configuration.extraction.k, 5);
        assert_eq!(configuration.extraction.resize_limit(), Some(800));
        assert_eq!(configuration.summary_path(), PathBuf::from("data/output/summary.csv"));
    }

    #[test]
    fn builder_overrides_and_validates() {
        let configuration = ConfigurationBuilder::new(Configuration::default())
            .k(3)
            .sample_frac(0.25)
            .random_seed(7)
            .build()
            .unwrap();
        assert_eq!(configuration.extraction.k, 3);
        assert_eq!(configuration.extraction.random_seed, 7);

        let err = ConfigurationBuilder::new(Configuration::default())
            .k(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidParameter("k", _)));
    }

    #[test]
    fn sample_fraction_must_be_in_unit_interval() {
        for bad in [0.0, -0.5, 1.5, f64::NAN] {
            let mut extraction = ExtractionConfig::default();
            extraction.sample_frac = bad;
            assert!(extraction.validate().is_err(), "{bad} accepted");
        }
    }

    #[test]
    fn loads_overrides_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[extraction]\nk = 7\ndegenerate = \"reject\"\n\n[palette]\nhex_column = \"Hex\""
        )
        .unwrap();

        let configuration = Configuration::load(Some(&path)).unwrap();
        assert_eq!(configuration.extraction.k, 7);
        assert_eq!(configuration.extraction.degenerate, DegeneratePolicy::Reject);
        assert_eq!(configuration.extraction.resize_max, 800);
        assert_eq!(configuration.palette.hex_column.as_deref(), Some("Hex"));
    }

    #[test]
    fn environment_overrides_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[output]\nstrip_width = 100\n").unwrap();

        std::env::set_var("COLOR_MOOD_OUTPUT__STRIP_WIDTH", "321");
        let loaded = Configuration::load(Some(&path));
        std::env::remove_var("COLOR_MOOD_OUTPUT__STRIP_WIDTH");

        let configuration = loaded.unwrap();
        assert_eq!(configuration.output.strip_width, 321);
        assert_eq!(configuration.output.strip_height, 120);
    }

    #[test]
    fn palette_source_settings_are_validated() {
        let mut configuration = Configuration::default();
        configuration.palette.page_size = 500;
        assert!(matches!(
            configuration.validate(),
            Err(AppError::InvalidParameter("page_size", _))
        ));

        let mut configuration = Configuration::default();
        configuration.palette.dataset = String::new();
        assert!(matches!(
            configuration.validate(),
            Err(AppError::InvalidParameter("dataset", _))
        ));

        let configuration = ConfigurationBuilder::new(configuration)
            .palette_path(PathBuf::from("palette.csv"))
            .build()
            .unwrap();
        assert_eq!(configuration.palette.path, Some(PathBuf::from("palette.csv")));
    }

    #[test]
    fn missing_explicit_file_is_a_config_error() {
        let err = Configuration::load(Some(Path::new("/nonexistent/color-mood.toml"))).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
