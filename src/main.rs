use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, Level};

use color_mood::config::ConfigurationBuilder;
use color_mood::pipeline::services::emotion::{shared_or_load, DatasetSource};
use color_mood::pipeline::services::summary::export;
use color_mood::pipeline::services::visualization::render_color_strip;
use color_mood::{
    AppError, BatchReport, Configuration, DatasetLoader, EmotionMapper, ImageInput,
    ProcessingPipeline, ReferencePalette,
};
use std::sync::Arc;

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

#[derive(Parser)]
#[command(name = "color-mood")]
#[command(version, about = "Dominant color and emotion analytics for images", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./color-mood.toml when present)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Local reference palette file (.csv, .json or .jsonl); overrides --dataset
    #[arg(short, long, value_name = "FILE", global = true)]
    palette: Option<PathBuf>,

    /// Named dataset to download the reference palette from
    #[arg(long, value_name = "NAME", global = true)]
    dataset: Option<String>,

    /// Column holding hex colors in the palette dataset
    #[arg(long, value_name = "NAME", global = true)]
    hex_column: Option<String>,

    /// Column holding emotion labels in the palette dataset
    #[arg(long, value_name = "NAME", global = true)]
    emotion_column: Option<String>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract dominant colors from images and label them with emotions
    Analyze {
        /// Image files or directories
        #[arg(value_name = "INPUTS", required = true)]
        inputs: Vec<PathBuf>,

        /// Number of dominant colors
        #[arg(short, long, value_name = "N")]
        k: Option<usize>,

        /// Longer-side pixel cap before clustering (0 disables resizing)
        #[arg(long, value_name = "PIXELS")]
        resize_max: Option<u32>,

        /// Fraction of pixels used for clustering
        #[arg(long, value_name = "FLOAT")]
        sample_frac: Option<f64>,

        /// Random seed for sampling and cluster initialisation
        #[arg(long, value_name = "SEED")]
        seed: Option<u64>,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        out: Option<PathBuf>,

        /// Also save a palette strip PNG per image
        #[arg(long)]
        strips: bool,
    },

    /// Print the emotion of a single hex color
    Lookup {
        /// Color as #rrggbb
        #[arg(value_name = "HEX")]
        hex: String,
    },
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, AppError> {
    let mut builder = ConfigurationBuilder::new(Configuration::load(cli.config.as_deref())?);
    if let Some(name) = cli.dataset {
        builder = builder.dataset(name);
    }
    if let Some(path) = cli.palette {
        builder = builder.palette_path(path);
    }
    if let Some(column) = cli.hex_column {
        builder = builder.hex_column(column);
    }
    if let Some(column) = cli.emotion_column {
        builder = builder.emotion_column(column);
    }

    match cli.command {
        Commands::Analyze {
            inputs,
            k,
            resize_max,
            sample_frac,
            seed,
            out,
            strips,
        } => {
            if let Some(k) = k {
                builder = builder.k(k);
            }
            if let Some(resize_max) = resize_max {
                builder = builder.resize_max(resize_max);
            }
            if let Some(sample_frac) = sample_frac {
                builder = builder.sample_frac(sample_frac);
            }
            if let Some(seed) = seed {
                builder = builder.random_seed(seed);
            }
            if let Some(out) = out {
                builder = builder.output_dir(out);
            }
            if strips {
                builder = builder.render_strips(true);
            }
            analyze(&builder.build()?, &inputs)
        }
        Commands::Lookup { hex } => {
            let configuration = builder.build()?;
            let mapper = EmotionMapper::new(load_palette(&configuration)?);
            println!("{} {}", hex, mapper.map_hex(&hex)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_palette(configuration: &Configuration) -> Result<Arc<ReferencePalette>, AppError> {
    let palette = shared_or_load(|| {
        let source = DatasetSource::from_config(&configuration.palette);
        info!("Loading reference palette from {}", source.describe());
        DatasetLoader::from_config(&configuration.palette).load_source(&source)
    })?;
    Ok(palette)
}

fn analyze(configuration: &Configuration, inputs: &[PathBuf]) -> Result<ExitCode, AppError> {
    let pipeline = ProcessingPipeline::builder()
        .extraction(configuration.extraction.clone())
        .palette(load_palette(configuration)?)
        .build()?;

    let files = expand_inputs(inputs);
    info!("Analyzing {} images", files.len());
    let report = pipeline.process_batch(files.into_iter().map(ImageInput::Path))?;

    write_outputs(configuration, &report)?;
    print_summary(&report);

    if report.all_failed() {
        error!("No image could be processed");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Directories contribute their image files in name order; files are taken as given.
fn expand_inputs(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            files.push(input.clone());
            continue;
        }
        match std::fs::read_dir(input) {
            Ok(entries) => {
                let mut found: Vec<PathBuf> = entries
                    .filter_map(|entry| entry.ok().map(|e| e.path()))
                    .filter(|path| is_image_file(path))
                    .collect();
                found.sort();
                files.extend(found);
            }
            Err(e) => error!("Cannot read directory {}: {}", input.display(), e),
        }
    }
    files
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn write_outputs(configuration: &Configuration, report: &BatchReport) -> Result<(), AppError> {
    report.table().write_csv(&configuration.summary_path())?;
    report.emotion_totals().write_csv(&configuration.totals_path())?;

    if configuration.output.render_strips {
        let strips_dir = configuration.output.dir.join("strips");
        for analysis in report.analyses() {
            let strip = render_color_strip(
                analysis.colors().clusters(),
                configuration.output.strip_width,
                configuration.output.strip_height,
            );
            let stem = Path::new(analysis.image_id())
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| analysis.image_id().to_string());
            export::save_png(&strips_dir.join(format!("{stem}.png")), &strip)?;
        }
    }
    Ok(())
}

fn print_summary(report: &BatchReport) {
    println!(
        "{:<24} {:>4} {:>8} {:>9}  {}",
        "image", "rank", "hex", "fraction", "emotion"
    );
    for row in report.table().rows() {
        println!(
            "{:<24} {:>4} {:>8} {:>8.1}%  {}",
            row.image,
            row.rank,
            row.hex,
            row.fraction * 100.0,
            row.emotion
        );
    }
    for failure in report.failures() {
        println!("{:<24} failed: {}", failure.image, failure.error);
    }
}
