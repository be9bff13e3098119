use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};

use photochain_core::detection::infrastructure::onnx_face_analyzer::OnnxFaceAnalyzer;
use photochain_core::export::group_export::{GroupExport, EXPORT_FILE_NAME};
use photochain_core::export::manifest::Manifest;
use photochain_core::grouping::domain::grouping_config::GroupingConfig;
use photochain_core::grouping::domain::result_partitioner::MatchResult;
use photochain_core::media::infrastructure::exif_timestamp_reader::ExifTimestampReader;
use photochain_core::media::infrastructure::image_file_reader::ImageFileReader;
use photochain_core::media::infrastructure::photo_finder::find_photos;
use photochain_core::pipeline::group_photos_use_case::GroupPhotosUseCase;
use photochain_core::pipeline::ingest_photos_use_case::IngestPhotosUseCase;
use photochain_core::pipeline::photo_review::{review, FaceStats, ReviewFilter};
use photochain_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use photochain_core::shared::constants::{
    DEFAULT_MANIFEST_NAME, DEFAULT_MIN_FACE_CONFIDENCE, EMBEDDING_MODEL_NAME, EMBEDDING_MODEL_URL,
    YOLO_MODEL_NAME, YOLO_MODEL_URL,
};
use photochain_core::shared::model_resolver;

/// Groups photos into timed events and links events that show the same person.
#[derive(Parser)]
#[command(name = "photochain", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze photos (timestamps and faces) and write a manifest.
    Scan(ScanArgs),
    /// Group the photos of a manifest and write group-info.json.
    Group(GroupArgs),
    /// List photos for manual review, most doubtful first.
    Review(ReviewArgs),
    /// Flip the face flag of photos in a manifest.
    Toggle(ToggleArgs),
}

#[derive(Args)]
struct ManifestArg {
    /// Manifest file.
    #[arg(long, default_value = DEFAULT_MANIFEST_NAME)]
    manifest: PathBuf,
}

#[derive(Args)]
struct ScanArgs {
    /// Photo directory (searched recursively) or a single photo.
    input: PathBuf,

    #[command(flatten)]
    manifest: ManifestArg,

    /// Minimum detector confidence for a face (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_MIN_FACE_CONFIDENCE)]
    min_confidence: f64,

    /// YOLO face detection model (downloaded when omitted).
    #[arg(long)]
    detector_model: Option<PathBuf>,

    /// ArcFace embedding model (downloaded when omitted).
    #[arg(long)]
    embedding_model: Option<PathBuf>,

    /// Directory searched for bundled models before downloading.
    #[arg(long)]
    models_dir: Option<PathBuf>,
}

#[derive(Args)]
struct GroupArgs {
    #[command(flatten)]
    manifest: ManifestArg,

    /// JSON grouping config; flags below override its fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Max minutes between consecutive photos of one event.
    #[arg(long)]
    cluster_gap_minutes: Option<u32>,

    /// Min days between linked events (inclusive).
    #[arg(long)]
    min_link_gap_days: Option<u32>,

    /// Max days between linked events (inclusive).
    #[arg(long)]
    max_link_gap_days: Option<u32>,

    /// Min face similarity for a link (-1.0 to 1.0).
    #[arg(long)]
    similarity_threshold: Option<f64>,

    /// Export document path.
    #[arg(long, short, default_value = EXPORT_FILE_NAME)]
    output: PathBuf,
}

#[derive(Args)]
struct ReviewArgs {
    #[command(flatten)]
    manifest: ManifestArg,

    /// all, face, no-face or failed.
    #[arg(long, default_value_t = ReviewFilter::All)]
    filter: ReviewFilter,

    /// Show at most this many photos.
    #[arg(long)]
    limit: Option<usize>,
}

#[derive(Args)]
struct ToggleArgs {
    #[command(flatten)]
    manifest: ManifestArg,

    /// Photos to flip, as listed in the manifest.
    #[arg(required = true)]
    photos: Vec<PathBuf>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    match Cli::parse().command {
        Command::Scan(args) => run_scan(args),
        Command::Group(args) => run_group(args),
        Command::Review(args) => run_review(args),
        Command::Toggle(args) => run_toggle(args),
    }
}

fn run_scan(args: ScanArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !args.input.exists() {
        return Err(format!("Input not found: {}", args.input.display()).into());
    }
    if !(0.0..=1.0).contains(&args.min_confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            args.min_confidence
        )
        .into());
    }

    let paths = find_photos(&args.input)?;
    if paths.is_empty() {
        return Err(format!("No photos found in {}", args.input.display()).into());
    }
    log::info!("Found {} photos", paths.len());

    let models_dir = args.models_dir.as_deref();
    let detector_path = match args.detector_model {
        Some(path) => path,
        None => resolve_model(YOLO_MODEL_NAME, YOLO_MODEL_URL, models_dir)?,
    };
    let embedding_path = match args.embedding_model {
        Some(path) => path,
        None => resolve_model(EMBEDDING_MODEL_NAME, EMBEDDING_MODEL_URL, models_dir)?,
    };
    let analyzer = OnnxFaceAnalyzer::new(&detector_path, &embedding_path, args.min_confidence)?;

    let progress: Box<dyn Fn(usize, usize) -> bool + Send> = Box::new(|current, total| {
        eprint!("\rAnalyzing photo {current}/{total}");
        true
    });
    let mut use_case = IngestPhotosUseCase::new(
        Box::new(ImageFileReader::new()),
        Box::new(ExifTimestampReader::new()),
        Box::new(analyzer),
        Box::new(StdoutPipelineLogger::default()),
        Some(progress),
    );
    let result = use_case.execute(&paths)?;
    eprintln!();

    let manifest = Manifest::from(result);
    manifest.save(&args.manifest.manifest)?;
    println!("{}", FaceStats::collect(&manifest.photos, &manifest.failed));
    log::info!("Manifest written to {}", args.manifest.manifest.display());
    Ok(())
}

fn run_group(args: GroupArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = grouping_config(&args)?;
    let use_case = GroupPhotosUseCase::new(&config)?;
    let manifest = Manifest::load(&args.manifest.manifest)?;

    let result = use_case.execute(&manifest.photos);
    print_groups(&result);

    GroupExport::from_result(&result)?.write_json(&args.output)?;
    log::info!("Groups written to {}", args.output.display());
    Ok(())
}

fn run_review(args: ReviewArgs) -> Result<(), Box<dyn std::error::Error>> {
    let manifest = Manifest::load(&args.manifest.manifest)?;
    let selected = review(&manifest.photos, &manifest.failed, args.filter);
    let limit = args.limit.unwrap_or(usize::MAX);

    for photo in selected.photos.iter().take(limit) {
        let timestamp = photo
            .timestamp
            .map(|t| t.to_string())
            .unwrap_or_else(|| "no timestamp".to_string());
        println!(
            "{:.3}  {:7}  {:19}  {}",
            photo.confidence(),
            if photo.has_face() { "face" } else { "no face" },
            timestamp,
            photo.path().display()
        );
    }
    for failed in selected.failed.iter().take(limit) {
        println!("failed  {}  ({})", failed.path.display(), failed.error);
    }

    println!("{}", FaceStats::collect(&manifest.photos, &manifest.failed));
    Ok(())
}

fn run_toggle(args: ToggleArgs) -> Result<(), Box<dyn std::error::Error>> {
    let path = &args.manifest.manifest;
    let mut manifest = Manifest::load(path)?;
    for photo in &args.photos {
        let has_face = manifest.toggle_face(photo)?;
        println!(
            "{}: {}",
            photo.display(),
            if has_face { "face" } else { "no face" }
        );
    }
    manifest.save(path)?;
    Ok(())
}

/// Defaults, then the config file, then explicit flags.
fn grouping_config(args: &GroupArgs) -> Result<GroupingConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => GroupingConfig::load(path)?,
        None => GroupingConfig::default(),
    };
    if let Some(minutes) = args.cluster_gap_minutes {
        config.cluster_gap_minutes = minutes;
    }
    if let Some(days) = args.min_link_gap_days {
        config.min_link_gap_days = days;
    }
    if let Some(days) = args.max_link_gap_days {
        config.max_link_gap_days = days;
    }
    if let Some(threshold) = args.similarity_threshold {
        config.similarity_threshold = threshold;
    }
    Ok(config)
}

fn print_groups(result: &MatchResult<'_>) {
    let mut chain_id = None;
    for group in &result.matched {
        let Some(position) = group.chain else {
            continue;
        };
        if chain_id != Some(position.chain_id) {
            chain_id = Some(position.chain_id);
            println!("Chain {}:", position.chain_id);
        }
        let link = position
            .next
            .map(|next| format!("  → group {} ({:.3})", next.group_id, next.similarity))
            .unwrap_or_default();
        println!(
            "  group {:4}  {}  {} photos{link}",
            group.id,
            group.cluster.start(),
            group.photos().len()
        );
    }

    println!(
        "{} chains, {} matched groups, {} unmatched groups, {} photos without timestamp",
        result.chain_count(),
        result.matched.len(),
        result.unmatched.len(),
        result.unclustered.len()
    );
}

fn resolve_model(
    name: &str,
    url: &str,
    bundled_dir: Option<&Path>,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {name}");
    let label = name.to_string();
    let path = model_resolver::resolve(
        name,
        url,
        bundled_dir,
        Some(Box::new(move |downloaded: u64, total: u64| {
            download_progress(&label, downloaded, total)
        })),
    )?;
    eprintln!();
    Ok(path)
}

fn download_progress(name: &str, downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading {name}... {pct}%");
    } else {
        eprint!("\rDownloading {name}... {downloaded} bytes");
    }
}
