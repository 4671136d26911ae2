//! yolo-curate: annotation-consistent curation for YOLO detection datasets.
//!
//! The pipeline takes a directory of raw images to a partitioned,
//! augmented training set:
//!
//! 1. [`label`]: run a detector over raw images and write annotation files,
//!    deleting images where nothing usable was found.
//! 2. [`split`]: copy newly labeled images into `train/val/test`.
//! 3. [`augment`]: copy the train partition into a processed tree and add
//!    one synthetic derivative per annotated image.
//! 4. [`stats`]: count images, annotation files and objects per partition.
//!
//! Every stage is idempotent over the file system: re-running a command
//! picks up where a previous run stopped without duplicating output.
//!
//! # Modules
//!
//! - [`annotation`]: records, boxes, the line codec, repair and the class schema
//! - [`layout`]: directory layout and image discovery
//! - [`overlay`]: box rendering for visual checks
//! - [`error`]: error types for yolo-curate operations

pub mod annotation;
pub mod augment;
pub mod error;
pub mod label;
pub mod layout;
pub mod overlay;
pub mod split;
pub mod stats;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;

use annotation::ClassSchema;
use augment::{AugmentConfig, AugmentPipeline};
use label::{AutoLabeler, CommandDetector, Detector, JsonDirDetector};
use layout::{Partition, PartitionDirs};
use split::SplitRatios;

pub use error::CurateError;

/// The yolo-curate CLI application.
#[derive(Parser)]
#[command(name = "yolo-curate")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Auto-label raw images with a detector, then split the new labels.
    Label(LabelArgs),
    /// Split labeled images that are not yet in any partition.
    Split(SplitArgs),
    /// Augment the train partition into a processed dataset tree.
    Augment(AugmentArgs),
    /// Print per-partition dataset statistics.
    Stats(StatsArgs),
    /// Draw annotation boxes over images.
    Overlay(OverlayArgs),
}

/// Report rendering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Ratio and seed options shared by `label` and `split`.
#[derive(clap::Args)]
struct RatioArgs {
    /// Fraction of images assigned to train.
    #[arg(long, default_value_t = 0.7, value_parser = parse_unit_interval)]
    train_ratio: f64,

    /// Fraction of images assigned to val.
    #[arg(long, default_value_t = 0.2, value_parser = parse_unit_interval)]
    val_ratio: f64,

    /// Fraction of images assigned to test (test also takes the remainder).
    #[arg(long, default_value_t = 0.1, value_parser = parse_unit_interval)]
    test_ratio: f64,

    /// Random seed for the shuffle. Drawn at random and logged if omitted.
    #[arg(long, env = "CURATE_SEED")]
    seed: Option<u64>,
}

impl RatioArgs {
    fn ratios(&self) -> Result<SplitRatios, CurateError> {
        SplitRatios::new(self.train_ratio, self.val_ratio, self.test_ratio)
    }
}

/// Arguments for the label subcommand.
#[derive(clap::Args)]
struct LabelArgs {
    /// Directory of raw images.
    #[arg(long)]
    input: PathBuf,

    /// Dataset root; labels go to `<output>/labels`, partitions under it.
    #[arg(long)]
    output: PathBuf,

    /// Class schema YAML (`names:` list or mapping).
    #[arg(long, env = "CURATE_CLASSES")]
    classes: PathBuf,

    /// Detector program, run once per image with the image path appended.
    #[arg(
        long,
        conflicts_with = "detections",
        required_unless_present = "detections"
    )]
    detector_cmd: Option<PathBuf>,

    /// Extra argument passed to the detector program (repeatable).
    #[arg(long = "detector-arg", allow_hyphen_values = true)]
    detector_args: Vec<String>,

    /// Directory of precomputed `<stem>.json` detections.
    #[arg(long)]
    detections: Option<PathBuf>,

    /// Minimum detection confidence.
    #[arg(long, default_value_t = 0.4, value_parser = parse_unit_interval)]
    conf: f64,

    /// Only label; do not copy new images into partitions.
    #[arg(long)]
    no_split: bool,

    #[command(flatten)]
    ratios: RatioArgs,

    /// Output format for the report ('text' or 'json').
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output_format: OutputFormat,
}

/// Arguments for the split subcommand.
#[derive(clap::Args)]
struct SplitArgs {
    /// Directory of labeled images.
    #[arg(long)]
    images: PathBuf,

    /// Directory of annotation files for those images.
    #[arg(long)]
    labels: PathBuf,

    /// Dataset root receiving `train/val/test`.
    #[arg(long)]
    output: PathBuf,

    #[command(flatten)]
    ratios: RatioArgs,

    /// Output format for the report ('text' or 'json').
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output_format: OutputFormat,
}

/// Arguments for the augment subcommand.
#[derive(clap::Args)]
struct AugmentArgs {
    /// Labeled dataset root containing `train/` (and optionally `val/`, `test/`).
    #[arg(long)]
    input: PathBuf,

    /// Processed dataset root.
    #[arg(long)]
    output: PathBuf,

    /// Augmentation tuning YAML. Built-in defaults if omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Master random seed. Drawn at random and logged if omitted.
    #[arg(long, env = "CURATE_SEED")]
    seed: Option<u64>,

    /// Do not copy val/test into the processed root.
    #[arg(long)]
    no_mirror: bool,

    /// Output format for the report ('text' or 'json').
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output_format: OutputFormat,
}

/// Arguments for the stats subcommand.
#[derive(clap::Args)]
struct StatsArgs {
    /// Dataset root containing partition directories.
    root: PathBuf,

    /// Partition to include (repeatable). All three if omitted.
    #[arg(long = "split", value_enum)]
    partitions: Vec<Partition>,

    /// Class schema YAML used to name classes in text output.
    #[arg(long)]
    classes: Option<PathBuf>,

    /// Output format for the report ('text' or 'json').
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output_format: OutputFormat,

    /// Also write the JSON report to this file.
    #[arg(long)]
    write: Option<PathBuf>,
}

/// Arguments for the overlay subcommand.
#[derive(clap::Args)]
struct OverlayArgs {
    /// Directory of images.
    #[arg(long)]
    images: PathBuf,

    /// Directory of annotation files.
    #[arg(long)]
    labels: PathBuf,

    /// Directory receiving the rendered images.
    #[arg(long)]
    output: PathBuf,

    /// Box outline thickness in pixels.
    #[arg(long, default_value_t = 2)]
    thickness: u32,
}

fn parse_unit_interval(value: &str) -> Result<f64, String> {
    let parsed: f64 = value
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    if (0.0..=1.0).contains(&parsed) {
        Ok(parsed)
    } else {
        Err(format!("{parsed} is outside [0, 1]"))
    }
}

/// Run the yolo-curate CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), CurateError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Label(args)) => run_label(args),
        Some(Commands::Split(args)) => run_split(args),
        Some(Commands::Augment(args)) => run_augment(args),
        Some(Commands::Stats(args)) => run_stats(args),
        Some(Commands::Overlay(args)) => run_overlay(args),
        None => {
            println!("yolo-curate {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Curation and augmentation for YOLO detection datasets.");
            println!();
            println!("Run 'yolo-curate --help' for usage information.");
            Ok(())
        }
    }
}

/// Build a seeded RNG, drawing and logging a seed if none was given.
pub fn seeded_rng(seed: Option<u64>) -> (StdRng, u64) {
    let seed = seed.unwrap_or_else(rand::random);
    info!("Using random seed {seed}");
    (StdRng::seed_from_u64(seed), seed)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CurateError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|source| CurateError::ReportSerialize { source })?;
    println!("{text}");
    Ok(())
}

#[derive(Serialize)]
struct LabelRunReport {
    label: label::LabelReport,
    split: Option<split::SplitReport>,
}

/// Execute the label subcommand.
fn run_label(args: LabelArgs) -> Result<(), CurateError> {
    let schema = ClassSchema::load(&args.classes)?;
    let ratios = args.ratios.ratios()?;
    let labels_dir = args.output.join("labels");

    let label_report = match (&args.detector_cmd, &args.detections) {
        (Some(program), _) => {
            let detector = CommandDetector::new(program, args.detector_args.clone(), args.conf);
            label_images(detector, &schema, &labels_dir, &args.input)?
        }
        (None, Some(dir)) => {
            let detector = JsonDirDetector::new(dir, args.conf);
            label_images(detector, &schema, &labels_dir, &args.input)?
        }
        (None, None) => {
            return Err(CurateError::ConfigMissing {
                path: args.input.clone(),
                message: "either --detector-cmd or --detections is required".to_string(),
            })
        }
    };

    let split_report = if args.no_split {
        None
    } else {
        let (mut rng, seed) = seeded_rng(args.ratios.seed);
        Some(split::assign_partitions(
            &label_report.labeled,
            &labels_dir,
            &args.output,
            &ratios,
            &mut rng,
            seed,
        )?)
    };

    match args.output_format {
        OutputFormat::Json => print_json(&LabelRunReport {
            label: label_report,
            split: split_report,
        }),
        OutputFormat::Text => {
            print!("{label_report}");
            if let Some(split_report) = split_report {
                print!("{split_report}");
            }
            Ok(())
        }
    }
}

fn label_images<D: Detector>(
    detector: D,
    schema: &ClassSchema,
    labels_dir: &Path,
    input: &Path,
) -> Result<label::LabelReport, CurateError> {
    AutoLabeler::new(detector, schema, labels_dir).label_directory(input)
}

/// Execute the split subcommand.
fn run_split(args: SplitArgs) -> Result<(), CurateError> {
    let ratios = args.ratios.ratios()?;
    let pending = split::unassigned_labeled_images(&args.images, &args.labels, &args.output)?;
    info!("{} labeled image(s) not yet in any partition", pending.len());

    let (mut rng, seed) = seeded_rng(args.ratios.seed);
    let report =
        split::assign_partitions(&pending, &args.labels, &args.output, &ratios, &mut rng, seed)?;

    match args.output_format {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Text => {
            print!("{report}");
            Ok(())
        }
    }
}

#[derive(Serialize)]
struct AugmentRunReport {
    augment: augment::AugmentReport,
    stats: stats::StatsReport,
}

/// Execute the augment subcommand.
fn run_augment(args: AugmentArgs) -> Result<(), CurateError> {
    let config = match &args.config {
        Some(path) => AugmentConfig::load(path)?,
        None => AugmentConfig::default(),
    };
    let pipeline = AugmentPipeline::new(&config);
    let (mut rng, seed) = seeded_rng(args.seed);

    let input = PartitionDirs::for_partition(&args.input, Partition::Train);
    let output = PartitionDirs::for_partition(&args.output, Partition::Train);
    let mut report = augment::augment_partition(&pipeline, &input, &output, &mut rng, seed)?;

    if !args.no_mirror {
        for partition in [Partition::Val, Partition::Test] {
            report
                .mirrored
                .push(augment::mirror_partition(&args.input, &args.output, partition)?);
        }
    }

    let stats_report = stats::analyze_dataset(&args.output, &Partition::ALL)?;
    let stats_path = args.output.join("stats.json");
    stats::write_json(&stats_report, &stats_path)?;
    info!("Saved statistics to {}", stats_path.display());

    match args.output_format {
        OutputFormat::Json => print_json(&AugmentRunReport {
            augment: report,
            stats: stats_report,
        }),
        OutputFormat::Text => {
            print!("{report}");
            print!("{stats_report}");
            Ok(())
        }
    }
}

/// Execute the stats subcommand.
fn run_stats(args: StatsArgs) -> Result<(), CurateError> {
    let partitions = if args.partitions.is_empty() {
        Partition::ALL.to_vec()
    } else {
        args.partitions.clone()
    };

    let mut report = stats::analyze_dataset(&args.root, &partitions)?;
    if let Some(path) = &args.classes {
        report = report.with_class_names(ClassSchema::load(path)?.names().to_vec());
    }
    if let Some(path) = &args.write {
        stats::write_json(&report, path)?;
    }

    match args.output_format {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Text => {
            print!("{report}");
            Ok(())
        }
    }
}

/// Execute the overlay subcommand.
fn run_overlay(args: OverlayArgs) -> Result<(), CurateError> {
    let report =
        overlay::overlay_directory(&args.images, &args.labels, &args.output, args.thickness)?;
    print!("{report}");
    Ok(())
}
