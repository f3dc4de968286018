//! # CLI Module
//!
//! Command-line interface for media-sieve.
//!
//! ## Usage
//! ```bash
//! # Copy one photo per near-duplicate set into a clean folder
//! media-sieve dedupe ~/Photos ~/Photos-clean
//!
//! # Stricter matching, HEIC converted to JPEG
//! media-sieve dedupe ~/Photos ~/Photos-clean --threshold 2 --convert-heic
//!
//! # Upload a library with thumbnails and a manifest
//! media-sieve upload --dir ~/Photos --bucket-dir /srv/photos --dedupe
//!
//! # Build favicon.ico from a logo
//! media-sieve favicon logo.png --output site/favicon.ico
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use media_sieve::core::comparator::DEFAULT_THRESHOLD;
use media_sieve::core::favicon::{create_favicon, FaviconConfig};
use media_sieve::core::hasher::HashAlgorithmKind;
use media_sieve::core::metadata::CaptureDate;
use media_sieve::core::pipeline::{Pipeline, PipelineReport};
use media_sieve::core::reporter::HtmlReportSink;
use media_sieve::core::sink::{CopySink, GroupSink, UploadConfig, UploadSink};
use media_sieve::core::storage::{publish_manifest, LocalObjectStore};
use media_sieve::error::{MediaSieveError, PipelineError, Result, ScanError};
use media_sieve::events::{Event, EventChannel, HashEvent, PipelineEvent, SinkEvent};
use std::path::{Path, PathBuf};
use std::thread;

/// Media Sieve - Keep one of each, never touch the originals
#[derive(Parser, Debug)]
#[command(name = "media-sieve")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Copy the earliest file of every near-duplicate set into OUTPUT
    Dedupe {
        /// Directory of photos to deduplicate
        input: PathBuf,

        /// Directory receiving the kept photos
        #[arg(value_name = "OUTPUT")]
        output_dir: PathBuf,

        /// Maximum fingerprint distance for a match (lower = stricter)
        #[arg(short, long, default_value_t = DEFAULT_THRESHOLD)]
        threshold: u32,

        /// Worker threads for hashing (default: CPUs - 1)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Write HEIC/HEIF photos as JPEG
        #[arg(long)]
        convert_heic: bool,

        /// Drop files that cannot be hashed instead of keeping them
        #[arg(long)]
        skip_invalid: bool,

        /// Hash algorithm to use
        #[arg(short, long, default_value = "perceptual")]
        algorithm: Algorithm,

        /// Descend into subdirectories
        #[arg(short, long)]
        recursive: bool,

        /// Where the HTML report is written
        #[arg(long, default_value = "duplicate_report")]
        report_dir: PathBuf,

        /// Output format
        #[arg(long = "output", default_value = "pretty")]
        format: OutputFormat,
    },

    /// Upload a media library into a bucket with thumbnails and a manifest
    Upload {
        /// Directory to upload
        #[arg(long, default_value = ".")]
        dir: PathBuf,

        /// Bucket root directory
        #[arg(long, env = "MEDIA_SIEVE_BUCKET_DIR")]
        bucket_dir: PathBuf,

        /// Upload only one photo per near-duplicate set
        #[arg(long)]
        dedupe: bool,

        /// Maximum fingerprint distance for a match when deduplicating
        #[arg(short, long, default_value_t = DEFAULT_THRESHOLD)]
        threshold: u32,

        /// Worker threads for hashing (default: CPUs - 1)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Do not extract video thumbnails
        #[arg(long)]
        skip_video_thumbnails: bool,

        /// Store HEIC/HEIF files unconverted
        #[arg(long)]
        no_convert_heic: bool,

        /// Only rebuild manifest.json from what the bucket already holds
        #[arg(long)]
        manifest_only: bool,

        /// Output format
        #[arg(long = "output", default_value = "pretty")]
        format: OutputFormat,
    },

    /// Build a multi-size favicon from an image
    Favicon {
        /// Source image
        input: PathBuf,

        /// ICO file to write
        #[arg(short, long, default_value = "favicon.ico")]
        output: PathBuf,

        /// Icon sizes in pixels
        #[arg(long, value_delimiter = ',', default_values_t = vec![16, 32, 48, 64, 128, 256])]
        sizes: Vec<u32>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Algorithm {
    /// Average Hash - Fast, good for exact duplicates
    Average,
    /// Difference Hash - Good balance
    Difference,
    /// Perceptual Hash - Most robust to edits (default)
    Perceptual,
}

impl From<Algorithm> for HashAlgorithmKind {
    fn from(algo: Algorithm) -> Self {
        match algo {
            Algorithm::Average => HashAlgorithmKind::Average,
            Algorithm::Difference => HashAlgorithmKind::Difference,
            Algorithm::Perceptual => HashAlgorithmKind::Perceptual,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    media_sieve::init_tracing(cli.verbose);

    match cli.command {
        Commands::Dedupe {
            input,
            output_dir,
            threshold,
            workers,
            convert_heic,
            skip_invalid,
            algorithm,
            recursive,
            report_dir,
            format,
        } => {
            let options = DedupeOptions {
                threshold,
                workers,
                convert_heic,
                skip_invalid,
                algorithm: algorithm.into(),
                recursive,
                report_dir,
            };
            run_dedupe(&input, &output_dir, options, format, cli.verbose)
        }
        Commands::Upload {
            dir,
            bucket_dir,
            dedupe,
            threshold,
            workers,
            skip_video_thumbnails,
            no_convert_heic,
            manifest_only,
            format,
        } => {
            let store = LocalObjectStore::open(&bucket_dir)?;
            if manifest_only {
                return run_manifest_only(&store, format);
            }
            let config = UploadConfig {
                convert_heic: !no_convert_heic,
                video_thumbnails: !skip_video_thumbnails,
                publish_manifest: true,
            };
            let pipeline = Pipeline::builder()
                .paths(vec![dir.clone()])
                .recursive(true)
                .include_videos(true)
                .dedupe(dedupe)
                .threshold(threshold)
                .workers(workers)
                .creation_times(Box::new(CaptureDate::default()))
                .build();
            let mut sinks: Vec<Box<dyn GroupSink>> = vec![Box::new(UploadSink::new(Box::new(store), config))];

            let term = Term::stderr();
            print_header(&term, format, "Uploading", &dir);
            let Some(report) = execute(&pipeline, &mut sinks, format)? else {
                return Ok(());
            };
            match format {
                OutputFormat::Pretty => {
                    print_pretty_results(&term, &report, cli.verbose);
                    term.write_line(&format!(
                        "  {} {}",
                        style("Bucket:").bold(),
                        display_path(&bucket_dir)
                    ))
                    .ok();
                }
                OutputFormat::Json => print_json_results(&report)?,
            }
            Ok(())
        }
        Commands::Favicon { input, output, sizes } => run_favicon(&input, &output, sizes),
    }
}

struct DedupeOptions {
    threshold: u32,
    workers: Option<usize>,
    convert_heic: bool,
    skip_invalid: bool,
    algorithm: HashAlgorithmKind,
    recursive: bool,
    report_dir: PathBuf,
}

fn run_dedupe(
    input: &Path,
    output_dir: &Path,
    options: DedupeOptions,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    if !input.is_dir() {
        return Err(ScanError::DirectoryNotFound {
            path: input.to_path_buf(),
        }
        .into());
    }
    std::fs::create_dir_all(output_dir).map_err(|e| {
        MediaSieveError::Config(format!(
            "cannot create output directory {}: {}",
            output_dir.display(),
            e
        ))
    })?;

    let pipeline = Pipeline::builder()
        .paths(vec![input.to_path_buf()])
        .recursive(options.recursive)
        .algorithm(options.algorithm)
        .threshold(options.threshold)
        .workers(options.workers)
        .skip_invalid(options.skip_invalid)
        .build();

    let report_sink = HtmlReportSink::new(&options.report_dir);
    let report_path = report_sink.report_path();
    let mut sinks: Vec<Box<dyn GroupSink>> = vec![
        Box::new(CopySink::new(output_dir).convert_heic(options.convert_heic)),
        Box::new(report_sink),
    ];

    let term = Term::stderr();
    print_header(&term, format, "Deduplicating", input);
    let Some(report) = execute(&pipeline, &mut sinks, format)? else {
        return Ok(());
    };

    match format {
        OutputFormat::Pretty => {
            print_pretty_results(&term, &report, verbose);
            term.write_line(&format!(
                "  {} {}",
                style("Clean photos:").bold(),
                display_path(output_dir)
            ))
            .ok();
            term.write_line(&format!(
                "  {} {}",
                style("HTML report:").bold(),
                display_path(&report_path)
            ))
            .ok();
            term.write_line("").ok();
            term.write_line(&format!(
                "{}",
                style("Source files were not modified.").dim()
            ))
            .ok();
        }
        OutputFormat::Json => print_json_results(&report)?,
    }

    Ok(())
}

fn run_manifest_only(store: &LocalObjectStore, format: OutputFormat) -> Result<()> {
    let manifest = publish_manifest(store)?;
    match format {
        OutputFormat::Pretty => {
            let term = Term::stderr();
            term.write_line(&format!(
                "{} Manifest published: {} photos, {} timeline entries",
                style("✓").green().bold(),
                style(manifest.total_photos).cyan(),
                manifest.timeline.len()
            ))
            .ok();
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&manifest)?),
    }
    Ok(())
}

fn run_favicon(input: &Path, output: &Path, sizes: Vec<u32>) -> Result<()> {
    let config = FaviconConfig::default().sizes(sizes);
    let written = create_favicon(input, output, &config)?;

    let term = Term::stderr();
    term.write_line(&format!("{} Favicon created", style("✓").green().bold()))
        .ok();
    for path in [&written.ico, &written.png, &written.apple_touch] {
        term.write_line(&format!("    {}", display_path(path))).ok();
    }
    Ok(())
}

fn print_header(term: &Term, format: OutputFormat, action: &str, path: &Path) {
    if matches!(format, OutputFormat::Pretty) {
        term.write_line(&format!(
            "{} {}",
            style("Media Sieve").bold().cyan(),
            style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        term.write_line(&format!("{} {}", action, display_path(path))).ok();
        term.write_line("").ok();
    }
}

/// Run the pipeline with a progress bar fed from the event channel.
///
/// `Ok(None)` means there was nothing to process; the message is already printed.
fn execute(
    pipeline: &Pipeline,
    sinks: &mut [Box<dyn GroupSink>],
    format: OutputFormat,
) -> Result<Option<PipelineReport>> {
    let (sender, receiver) = EventChannel::new();

    // Progress bar for pretty output
    let progress = if matches!(format, OutputFormat::Pretty) {
        let pb = ProgressBar::new(0);
        let bar_style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(bar_style);
        Some(pb)
    } else {
        None
    };

    let progress_clone = progress.clone();

    // Handle events in a separate thread
    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            let Some(ref pb) = progress_clone else {
                continue;
            };
            match event {
                Event::Pipeline(PipelineEvent::PhaseChanged { phase }) => {
                    pb.set_message(format!("{}", phase));
                }
                Event::Hash(HashEvent::Started { total, .. }) => {
                    pb.set_length(total as u64);
                    pb.set_position(0);
                }
                Event::Hash(HashEvent::Progress(p)) => {
                    pb.set_position(p.completed as u64);
                }
                Event::Sink(SinkEvent::Started { selections }) => {
                    pb.set_length(selections as u64);
                    pb.set_position(0);
                }
                Event::Sink(SinkEvent::Progress { completed, .. }) => {
                    pb.set_position(completed as u64);
                }
                Event::Sink(SinkEvent::Failed { path, message }) => {
                    pb.println(format!(
                        "  {} {}: {}",
                        style("!").yellow().bold(),
                        display_path(&path),
                        message
                    ));
                }
                Event::Pipeline(PipelineEvent::Completed { .. })
                | Event::Pipeline(PipelineEvent::Cancelled) => {
                    pb.finish_and_clear();
                }
                _ => {}
            }
        }
    });

    let result = pipeline.run_with_events(sinks, &sender);

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    match result {
        Ok(report) => Ok(Some(report)),
        Err(MediaSieveError::Pipeline(PipelineError::NoInput { paths })) => {
            match format {
                OutputFormat::Pretty => {
                    let dirs: Vec<String> = paths.iter().map(|p| display_path(p)).collect();
                    Term::stderr()
                        .write_line(&format!(
                            "  {} No media files found in {}",
                            style("∅").dim(),
                            dirs.join(", ")
                        ))
                        .ok();
                }
                OutputFormat::Json => {
                    let output = serde_json::json!({
                        "processed": 0,
                        "kept": 0,
                        "removed": 0,
                        "failed": 0,
                        "message": "no media files found",
                    });
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
            }
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn print_pretty_results(term: &Term, report: &PipelineReport, verbose: bool) {
    let summary = report.summary();

    term.write_line(&format!("{} Run Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();

    term.write_line(&format!(
        "  {} files processed in {:.1}s",
        style(summary.processed).cyan(),
        summary.duration_ms as f64 / 1000.0
    ))
    .ok();
    term.write_line(&format!("  {} kept", style(summary.kept).green()))
        .ok();
    term.write_line(&format!("  {} duplicates removed", style(summary.removed).cyan()))
        .ok();
    if summary.processed > 0 {
        term.write_line(&format!(
            "  {:.1}% duplication rate",
            summary.removed as f64 / summary.processed as f64 * 100.0
        ))
        .ok();
    }
    if summary.failed > 0 {
        term.write_line(&format!("  {} failed", style(summary.failed).red()))
            .ok();
    }
    term.write_line("").ok();

    let sets: Vec<_> = report.duplicate_sets().collect();
    if sets.is_empty() {
        term.write_line(&format!("  {} No duplicates found!", style("🎉").green()))
            .ok();
    } else if verbose {
        term.write_line(&format!("{}", style("Duplicate Groups:").bold().underlined()))
            .ok();
        term.write_line("").ok();

        for (i, selection) in sets.iter().enumerate() {
            term.write_line(&format!(
                "  {} {} ({} files, {})",
                style(format!("Group {}:", i + 1)).bold(),
                style(format!("{}", selection.match_type())).yellow(),
                selection.len(),
                format_bytes(removed_bytes(selection.removed.iter().map(|f| f.path.as_path())))
            ))
            .ok();
            term.write_line(&format!(
                "    {} {}",
                style("★").green(),
                display_path(&selection.kept.path)
            ))
            .ok();
            for file in &selection.removed {
                term.write_line(&format!("    {} {}", style("○").dim(), display_path(&file.path)))
                    .ok();
            }
            term.write_line("").ok();
        }
    } else {
        term.write_line(&format!(
            "  {} duplicate sets ({} reclaimable), use --verbose to list them",
            style(sets.len()).cyan(),
            style(format_bytes(removed_bytes(
                sets.iter().flat_map(|s| s.removed.iter().map(|f| f.path.as_path()))
            )))
            .yellow()
        ))
        .ok();
        term.write_line("").ok();
    }

    if !report.failures.is_empty() {
        term.write_line(&format!("{}", style("Failures:").bold().underlined()))
            .ok();
        for failure in &report.failures {
            term.write_line(&format!(
                "  {} [{}] {}: {}",
                style("✗").red(),
                failure.stage,
                display_path(&failure.path),
                failure.reason
            ))
            .ok();
        }
        term.write_line("").ok();
    }
}

fn print_json_results(report: &PipelineReport) -> Result<()> {
    let output = serde_json::json!({
        "summary": report.summary(),
        "selections": report.selections.iter().map(|s| {
            serde_json::json!({
                "group_id": s.group_id,
                "match_type": format!("{}", s.match_type()),
                "kept": s.kept.path,
                "removed": s.removed.iter().map(|f| &f.path).collect::<Vec<_>>(),
            })
        }).collect::<Vec<_>>(),
        "failures": report.failures,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn removed_bytes<'a>(paths: impl Iterator<Item = &'a Path>) -> u64 {
    paths
        .filter_map(|p| std::fs::metadata(p).ok())
        .map(|m| m.len())
        .sum()
}

fn display_path(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(rest) = path.strip_prefix(&home) {
            return format!("~/{}", rest.display());
        }
    }
    path.display().to_string()
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn dedupe_defaults() {
        let cli = Cli::try_parse_from(["media-sieve", "dedupe", "in", "out"]).unwrap();
        match cli.command {
            Commands::Dedupe {
                threshold,
                algorithm,
                report_dir,
                recursive,
                ..
            } => {
                assert_eq!(threshold, 5);
                assert!(matches!(algorithm, Algorithm::Perceptual));
                assert_eq!(report_dir, PathBuf::from("duplicate_report"));
                assert!(!recursive);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn favicon_sizes_are_comma_separated() {
        let cli = Cli::try_parse_from(["media-sieve", "favicon", "logo.png", "--sizes", "16,32"]).unwrap();
        match cli.command {
            Commands::Favicon { sizes, output, .. } => {
                assert_eq!(sizes, vec![16, 32]);
                assert_eq!(output, PathBuf::from("favicon.ico"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn format_bytes_units() {
        assert_eq!(format_bytes(512), "512 bytes");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}
