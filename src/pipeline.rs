use filetime::FileTime;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::motion::{self, MicroVideo};
use crate::pairing::{self, MediaPair};
use crate::validate;

/// What a run operates on, resolved from the command-line inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Discover and convert every pair directly inside a directory.
    Directory(PathBuf),
    /// Convert one explicitly given pair.
    Single(MediaPair),
}

impl RunMode {
    /// Pick the run mode from the optional inputs.
    ///
    /// A directory wins over an explicit pair. Otherwise photo and video must
    /// be given together.
    ///
    /// ```rust
    /// use motion_muxer::pipeline::RunMode;
    /// use std::path::PathBuf;
    ///
    /// let mode = RunMode::resolve(Some(PathBuf::from("shots")), Some(PathBuf::from("a.jpg")), None);
    /// assert_eq!(mode.unwrap(), RunMode::Directory(PathBuf::from("shots")));
    ///
    /// assert!(RunMode::resolve(None, Some(PathBuf::from("a.jpg")), None).is_err());
    /// ```
    pub fn resolve(
        dir: Option<PathBuf>,
        photo: Option<PathBuf>,
        video: Option<PathBuf>,
    ) -> Result<Self> {
        if let Some(dir) = dir {
            return Ok(Self::Directory(dir));
        }
        match (photo, video) {
            (Some(photo), Some(video)) => Ok(Self::Single(MediaPair { photo, video })),
            (Some(_), None) => Err(Error::IncompletePair { missing: "video" }),
            (None, Some(_)) => Err(Error::IncompletePair { missing: "photo" }),
            (None, None) => Err(Error::NoInput),
        }
    }
}

/// The result of converting a single pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConvertOutcome {
    pub photo: PathBuf,
    pub video: PathBuf,
    pub output: PathBuf,
    pub photo_size: u64,
    /// Size of photo+video before the XMP header was added.
    pub merged_size: u64,
    /// Value written to `GCamera:MicroVideoOffset`.
    pub offset: u64,
}

/// A pair that failed during merge or metadata writing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub photo: PathBuf,
    pub error: String,
}

/// Everything a run did (or, for a dry run, would do).
#[derive(Debug, Default, Serialize)]
pub struct BatchReport {
    pub converted: Vec<ConvertOutcome>,
    /// Pairs that passed validation during a dry run.
    pub planned: Vec<MediaPair>,
    /// Pairs rejected by media validation.
    pub skipped: Vec<MediaPair>,
    pub failed: Vec<Failure>,
    /// Destinations of leftover files copied with `copy_all`.
    pub copied: Vec<PathBuf>,
    pub dry_run: bool,
}

impl BatchReport {
    fn new(config: &Config) -> Self {
        Self {
            dry_run: config.dry_run,
            ..Self::default()
        }
    }
}

/// Merge one photo with its clip and tag the result as a motion photo.
///
/// The offset is the merged size minus the photo size, both taken from the
/// filesystem after the merge. If tagging fails the merged file is removed so
/// an untagged output is never left behind.
pub fn convert(photo: &Path, video: &Path, config: &Config) -> Result<ConvertOutcome> {
    let output = motion::merge_files(photo, video, &config.output_dir)?;

    let photo_size = file_size(photo)?;
    let merged_size = file_size(&output)?;
    let offset = merged_size
        .checked_sub(photo_size)
        .ok_or_else(|| Error::OffsetOutOfRange {
            path: output.clone(),
            offset: photo_size,
            size: merged_size,
        })?;
    log::info!(
        "Merged size {merged_size}, photo size {photo_size}, video offset {offset}"
    );

    let tags = MicroVideo {
        offset,
        presentation_timestamp_us: config.presentation_timestamp_us,
    };
    if let Err(e) = motion::add_xmp_metadata(&output, &tags) {
        if let Err(rm) = fs::remove_file(&output) {
            log::warn!("Failed to remove {}: {rm}", output.display());
        }
        return Err(e);
    }

    Ok(ConvertOutcome {
        photo: photo.to_path_buf(),
        video: video.to_path_buf(),
        output,
        photo_size,
        merged_size,
        offset,
    })
}

fn file_size(path: &Path) -> Result<u64> {
    Ok(fs::metadata(path).map_err(|e| Error::io(path, e))?.len())
}

/// Run the given mode to completion.
///
/// Only pre-flight problems (and, in single-pair mode, a failed conversion)
/// come back as `Err`. Per-pair problems in directory mode are logged and
/// recorded in the report.
pub fn run(mode: &RunMode, config: &Config) -> Result<BatchReport> {
    match mode {
        RunMode::Directory(dir) => run_directory(dir, config),
        RunMode::Single(pair) => run_single(pair, config),
    }
}

/// Convert one explicit pair.
pub fn run_single(pair: &MediaPair, config: &Config) -> Result<BatchReport> {
    let mut report = BatchReport::new(config);
    if !validate::validate_media(&pair.photo, &pair.video) {
        report.skipped.push(pair.clone());
        return Ok(report);
    }
    if config.dry_run {
        log::info!("Would convert {}", pair.photo.display());
        report.planned.push(pair.clone());
        return Ok(report);
    }
    report.converted.push(convert(&pair.photo, &pair.video, config)?);
    Ok(report)
}

/// Convert every pair in `dir`, then optionally copy the leftovers.
pub fn run_directory(dir: &Path, config: &Config) -> Result<BatchReport> {
    validate::validate_directory(dir)?;
    let pairs = pairing::process_directory(dir, config.recurse)?;

    let mut report = BatchReport::new(config);
    let mut processed: HashSet<PathBuf> = HashSet::new();

    for pair in pairs {
        if !validate::validate_media(&pair.photo, &pair.video) {
            report.skipped.push(pair);
            continue;
        }
        if config.dry_run {
            log::info!("Would convert {}", pair.photo.display());
            processed.insert(pair.photo.clone());
            processed.insert(pair.video.clone());
            report.planned.push(pair);
            continue;
        }
        match convert(&pair.photo, &pair.video, config) {
            Ok(outcome) => {
                processed.insert(pair.photo);
                processed.insert(pair.video);
                report.converted.push(outcome);
            }
            Err(e) => {
                log::error!("Failed to convert {}: {e}", pair.photo.display());
                report.failed.push(Failure {
                    photo: pair.photo,
                    error: e.to_string(),
                });
            }
        }
    }

    if config.copy_all {
        let mut remaining: Vec<PathBuf> = pairing::list_files(dir)?
            .into_iter()
            .filter(|p| !processed.contains(p))
            .collect();
        remaining.sort();
        report.copied = copy_remaining(&remaining, &config.output_dir, config.dry_run)?;
    }

    log::info!(
        "Converted {}, skipped {}, failed {}, copied {}",
        report.converted.len(),
        report.skipped.len(),
        report.failed.len(),
        report.copied.len()
    );
    Ok(report)
}

/// Copy files into `output_dir` under their original names.
///
/// Returns the destination paths. A file that would be copied onto itself is
/// left alone.
pub fn copy_remaining(
    files: &[PathBuf],
    output_dir: &Path,
    dry_run: bool,
) -> Result<Vec<PathBuf>> {
    if !dry_run {
        fs::create_dir_all(output_dir).map_err(|e| Error::io(output_dir, e))?;
    }

    let mut copied = Vec::with_capacity(files.len());
    for src in files {
        let Some(name) = src.file_name() else {
            continue;
        };
        let dest = output_dir.join(name);
        if is_same_file(src, &dest) {
            log::warn!(
                "Skipping {}: source and destination are the same file",
                src.display()
            );
            continue;
        }
        if dry_run {
            log::info!("Would copy {} to {}", src.display(), dest.display());
        } else {
            copy_preserving(src, &dest)?;
            log::info!("Copied {} to {}", src.display(), dest.display());
        }
        copied.push(dest);
    }
    Ok(copied)
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Byte-for-byte copy that keeps permissions and access/modification times.
fn copy_preserving(src: &Path, dest: &Path) -> Result<()> {
    fs::copy(src, dest).map_err(|e| Error::io(src, e))?;
    let meta = fs::metadata(src).map_err(|e| Error::io(src, e))?;
    let atime = FileTime::from_last_access_time(&meta);
    let mtime = FileTime::from_last_modification_time(&meta);
    if let Err(e) = filetime::set_file_times(dest, atime, mtime) {
        // Not every filesystem lets us set times; the copy itself succeeded.
        log::warn!("Could not preserve timestamps on {}: {e}", dest.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::jpeg::tests::tiny_jpeg;
    use crate::motion::read_motion_photo;
    use tempfile::TempDir;

    struct Fixture {
        _tmp: TempDir,
        src: PathBuf,
        out: PathBuf,
    }

    /// `a.jpg`+`a.mov`, `b.jpeg`+`b.mp4`, and a stray `c.txt`.
    fn fixture() -> Fixture {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let out = tmp.path().join("out");
        fs::create_dir(&src).unwrap();
        fs::write(src.join("a.jpg"), tiny_jpeg()).unwrap();
        fs::write(src.join("a.mov"), b"mov-clip-a").unwrap();
        fs::write(src.join("b.jpeg"), tiny_jpeg()).unwrap();
        fs::write(src.join("b.mp4"), b"mp4-clip-b!").unwrap();
        fs::write(src.join("c.txt"), b"notes").unwrap();
        Fixture { _tmp: tmp, src, out }
    }

    fn config(out: &Path) -> Config {
        Config {
            output_dir: out.to_path_buf(),
            ..Config::default()
        }
    }

    fn names(dir: &Path) -> Vec<String> {
        let mut v: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        v.sort();
        v
    }

    #[test]
    fn resolve_prefers_directory() {
        let mode = RunMode::resolve(
            Some(PathBuf::from("d")),
            Some(PathBuf::from("p.jpg")),
            Some(PathBuf::from("p.mov")),
        )
        .unwrap();
        assert_eq!(mode, RunMode::Directory(PathBuf::from("d")));
    }

    #[test]
    fn resolve_single_pair() {
        let mode = RunMode::resolve(None, Some("p.jpg".into()), Some("p.mov".into())).unwrap();
        assert_eq!(mode, RunMode::Single(MediaPair::new("p.jpg", "p.mov")));
    }

    #[test]
    fn resolve_rejects_half_pair_and_nothing() {
        let err = RunMode::resolve(None, Some("p.jpg".into()), None).unwrap_err();
        assert!(matches!(err, Error::IncompletePair { missing: "video" }));
        let err = RunMode::resolve(None, None, Some("p.mov".into())).unwrap_err();
        assert!(matches!(err, Error::IncompletePair { missing: "photo" }));
        assert!(matches!(
            RunMode::resolve(None, None, None),
            Err(Error::NoInput)
        ));
    }

    #[test]
    fn offset_equals_video_size() {
        let fx = fixture();
        let photo = fx.src.join("a.jpg");
        let video = fx.src.join("a.mov");
        let outcome = convert(&photo, &video, &config(&fx.out)).unwrap();

        let p = fs::metadata(&photo).unwrap().len();
        let v = fs::metadata(&video).unwrap().len();
        assert_eq!(outcome.photo_size, p);
        assert_eq!(outcome.merged_size, p + v);
        assert_eq!(outcome.offset, v);

        let bytes = fs::read(&outcome.output).unwrap();
        assert_eq!(&bytes[bytes.len() - v as usize..], b"mov-clip-a");
        assert_eq!(read_motion_photo(&outcome.output).unwrap().offset, v);
    }

    #[test]
    fn failed_tagging_removes_output() {
        let fx = fixture();
        let photo = fx.src.join("bad.jpg");
        fs::write(&photo, b"not really a jpeg").unwrap();
        let err = convert(&photo, &fx.src.join("a.mov"), &config(&fx.out)).unwrap_err();
        assert!(matches!(err, Error::Jpeg { .. }));
        assert!(!fx.out.join("bad.jpg").exists());
    }

    #[test]
    fn directory_without_copyall() {
        let fx = fixture();
        let report = run_directory(&fx.src, &config(&fx.out)).unwrap();

        assert_eq!(report.converted.len(), 2);
        assert!(report.copied.is_empty());
        assert_eq!(names(&fx.out), vec!["a.jpg", "b.jpeg"]);
        assert!(fx.src.join("c.txt").exists());
    }

    #[test]
    fn directory_with_copyall() {
        let fx = fixture();
        let cfg = Config {
            copy_all: true,
            ..config(&fx.out)
        };
        let report = run_directory(&fx.src, &cfg).unwrap();

        assert_eq!(report.copied, vec![fx.out.join("c.txt")]);
        assert_eq!(names(&fx.out), vec!["a.jpg", "b.jpeg", "c.txt"]);
        assert_eq!(fs::read(fx.out.join("c.txt")).unwrap(), b"notes");
    }

    #[test]
    fn copy_keeps_modification_time() {
        let fx = fixture();
        let src = fx.src.join("c.txt");
        let old = FileTime::from_unix_time(1_000_000_000, 0);
        filetime::set_file_mtime(&src, old).unwrap();

        copy_remaining(&[src], &fx.out, false).unwrap();
        let meta = fs::metadata(fx.out.join("c.txt")).unwrap();
        assert_eq!(FileTime::from_last_modification_time(&meta), old);
    }

    #[test]
    fn failed_pair_is_copied_through() {
        let fx = fixture();
        fs::write(fx.src.join("b.jpeg"), b"garbage").unwrap();
        let cfg = Config {
            copy_all: true,
            ..config(&fx.out)
        };
        let report = run_directory(&fx.src, &cfg).unwrap();

        assert_eq!(report.converted.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(fs::read(fx.out.join("b.jpeg")).unwrap(), b"garbage");
        assert!(fx.out.join("b.mp4").exists());
    }

    #[test]
    fn recurse_fails_before_writing() {
        let fx = fixture();
        let cfg = Config {
            recurse: true,
            copy_all: true,
            ..config(&fx.out)
        };
        let err = run_directory(&fx.src, &cfg).unwrap_err();
        assert!(err.is_fatal());
        assert!(!fx.out.exists());
    }

    #[test]
    fn missing_directory_is_fatal() {
        let fx = fixture();
        let err = run_directory(&fx.src.join("nope"), &config(&fx.out)).unwrap_err();
        assert!(matches!(err, Error::DirectoryNotFound(_)));
    }

    #[test]
    fn single_pair_with_bad_extension_is_skipped() {
        let fx = fixture();
        let pair = MediaPair::new(fx.src.join("a.jpg"), fx.src.join("c.txt"));
        let report = run(&RunMode::Single(pair.clone()), &config(&fx.out)).unwrap();
        assert_eq!(report.skipped, vec![pair]);
        assert!(!fx.out.exists());
    }

    #[test]
    fn single_pair_converts() {
        let fx = fixture();
        let pair = MediaPair::new(fx.src.join("b.jpeg"), fx.src.join("b.mp4"));
        let report = run(&RunMode::Single(pair), &config(&fx.out)).unwrap();
        assert_eq!(report.converted.len(), 1);
        assert_eq!(report.converted[0].output, fx.out.join("b.jpeg"));
    }

    #[test]
    fn dry_run_writes_nothing() {
        let fx = fixture();
        let cfg = Config {
            copy_all: true,
            dry_run: true,
            ..config(&fx.out)
        };
        let report = run_directory(&fx.src, &cfg).unwrap();

        assert!(report.dry_run);
        assert_eq!(report.planned.len(), 2);
        assert!(report.converted.is_empty());
        assert_eq!(report.copied, vec![fx.out.join("c.txt")]);
        assert!(!fx.out.exists());
    }

    #[test]
    fn report_serializes_to_json() {
        let fx = fixture();
        let report = run_directory(&fx.src, &config(&fx.out)).unwrap();
        let json: serde_json::Value = serde_json::to_value(&report).unwrap();
        assert_eq!(json["converted"].as_array().unwrap().len(), 2);
        assert_eq!(json["dry_run"], false);
    }
}
