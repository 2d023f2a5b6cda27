use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

use motion_muxer::config::Config;
use motion_muxer::motion::{self, MotionPhotoInfo};
use motion_muxer::pipeline::{self, BatchReport, RunMode};

/// Written by `--init` when no `--config` path is given.
const DEFAULT_CONFIG_FILE: &str = "motion-muxer.json";

#[derive(Parser, Debug)]
#[command(
    name = "motion-muxer",
    version,
    about = "Combine a JPEG and a MOV/MP4 clip into a Google Camera compatible motion photo"
)]
struct Cli {
    /// Still photo (JPEG)
    #[arg(long, value_name = "FILE")]
    photo: Option<PathBuf>,

    /// Video clip (MOV or MP4)
    #[arg(long, value_name = "FILE")]
    video: Option<PathBuf>,

    /// Directory of photo/video pairs sharing base names. Takes precedence over --photo/--video
    #[arg(long, value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Recurse into subdirectories (not implemented, always an error)
    #[arg(long)]
    recurse: bool,

    /// Output directory [default: output]
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// In --dir mode, also copy every file that was not converted into the output directory
    #[arg(long = "copyall")]
    copy_all: bool,

    /// Path to a JSON config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write a default config file and exit
    #[arg(long)]
    init: bool,

    /// Show what would be converted and copied without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Print the run report as JSON
    #[arg(long)]
    json: bool,

    /// Show the Micro Video tags of a motion photo and exit
    #[arg(long, value_name = "FILE")]
    inspect: Option<PathBuf>,

    /// Write the embedded video of a motion photo to <output>/<name>.mp4 and exit
    #[arg(long, value_name = "FILE")]
    extract: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "info" } else { "error" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Handle --init
    if cli.init {
        let path = cli
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Config::default().save(&path)?;
        println!("Default config written to {}", path.display());
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(output) = &cli.output {
        config.output_dir = output.clone();
    }
    config.copy_all |= cli.copy_all;
    config.recurse |= cli.recurse;
    config.dry_run |= cli.dry_run;

    // Handle --inspect
    if let Some(path) = &cli.inspect {
        let info = motion::read_motion_photo(path)
            .with_context(|| format!("Failed to read motion photo {}", path.display()))?;
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&info)?);
        } else {
            print_info(path, &info);
        }
        return Ok(());
    }

    // Handle --extract
    if let Some(path) = &cli.extract {
        let dest = extract_destination(path, &config.output_dir)?;
        let written = motion::extract_video(path, &dest)
            .with_context(|| format!("Failed to extract video from {}", path.display()))?;
        println!("Wrote {written} bytes to {}", dest.display());
        return Ok(());
    }

    let mode = RunMode::resolve(cli.dir, cli.photo, cli.video)?;
    if config.dry_run {
        log::info!("DRY RUN: no files will be written");
    }
    let report = pipeline::run(&mode, &config)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }
    Ok(())
}

fn extract_destination(path: &Path, output_dir: &Path) -> Result<PathBuf> {
    let stem = path
        .file_stem()
        .with_context(|| format!("{} has no file name", path.display()))?;
    let mut name = stem.to_os_string();
    name.push(".mp4");
    Ok(output_dir.join(name))
}

// ANSI color codes
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

fn print_info(path: &Path, info: &MotionPhotoInfo) {
    println!("{BOLD}{}{RESET}", path.display());
    println!("  {DIM}{}{RESET}", "─".repeat(48));
    print_row("MicroVideo", &info.micro_video.to_string());
    print_row(
        "MicroVideoVersion",
        &info.version.map_or_else(|| "-".to_string(), |v| v.to_string()),
    );
    print_row("MicroVideoOffset", &info.offset.to_string());
    print_row(
        "MicroVideoPresentationTimestampUs",
        &info
            .presentation_timestamp_us
            .map_or_else(|| "-".to_string(), |v| v.to_string()),
    );
    print_row("FileSize", &info.file_size.to_string());
    print_row("VideoStart", &info.video_start().to_string());
}

fn print_row(label: &str, value: &str) {
    println!("  {DIM}{label:<36}{RESET}{value}");
}

fn print_summary(report: &BatchReport) {
    for outcome in &report.converted {
        println!(
            "  {GREEN}✓{RESET} {} {DIM}(offset {}){RESET}",
            outcome.output.display(),
            outcome.offset
        );
    }
    for pair in &report.planned {
        println!(
            "  {DIM}would convert{RESET} {} + {}",
            pair.photo.display(),
            pair.video.display()
        );
    }
    for pair in &report.skipped {
        println!("  {YELLOW}skipped{RESET} {}", pair.photo.display());
    }
    for failure in &report.failed {
        println!("  {RED}✗{RESET} {}: {}", failure.photo.display(), failure.error);
    }
    let verb = if report.dry_run { "would copy" } else { "copied" };
    for dest in &report.copied {
        println!("  {DIM}{verb}{RESET} {}", dest.display());
    }

    if report.dry_run {
        println!(
            "{BOLD}Dry run:{RESET} {} to convert, {} skipped, {} to copy",
            report.planned.len(),
            report.skipped.len(),
            report.copied.len()
        );
    } else {
        println!(
            "{BOLD}Done:{RESET} {} converted, {} skipped, {} failed, {} copied",
            report.converted.len(),
            report.skipped.len(),
            report.failed.len(),
            report.copied.len()
        );
    }
}
