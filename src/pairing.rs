use serde::Serialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::validate::MediaKind;

/// Sibling video extensions, probed in this order. First hit wins.
pub const VIDEO_PROBE_ORDER: &[&str] = &["mov", "mp4", "MOV", "MP4"];

/// A still photo and the clip that belongs to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaPair {
    pub photo: PathBuf,
    pub video: PathBuf,
}

impl MediaPair {
    pub fn new(photo: impl Into<PathBuf>, video: impl Into<PathBuf>) -> Self {
        Self {
            photo: photo.into(),
            video: video.into(),
        }
    }
}

/// Find the video sharing the photo's base name, if any.
pub fn matching_video(photo: &Path) -> Option<PathBuf> {
    let base = photo.with_extension("");
    VIDEO_PROBE_ORDER.iter().find_map(|ext| {
        let mut candidate: OsString = base.clone().into_os_string();
        candidate.push(".");
        candidate.push(ext);
        let candidate = PathBuf::from(candidate);
        candidate.exists().then_some(candidate)
    })
}

/// List the regular files directly inside `dir`.
///
/// Entries come back in directory-listing order, which is unspecified.
pub fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| Error::io(dir, e.into()))?;
        let p = entry.path();
        if p.is_file() {
            files.push(p.to_path_buf());
        }
    }
    Ok(files)
}

/// Discover photo/video pairs among the direct children of `dir`.
///
/// JPEGs without a matching clip are dropped. Pairs are sorted by photo
/// path so callers see a stable order.
pub fn process_directory(dir: &Path, recurse: bool) -> Result<Vec<MediaPair>> {
    if recurse {
        return Err(Error::RecursionNotImplemented);
    }

    let mut pairs: Vec<MediaPair> = list_files(dir)?
        .into_iter()
        .filter(|p| MediaKind::from_path(p) == Some(MediaKind::Photo))
        .filter_map(|photo| match matching_video(&photo) {
            Some(video) => Some(MediaPair { photo, video }),
            None => {
                log::info!("No matching video for {}", photo.display());
                None
            }
        })
        .collect();

    pairs.sort_by(|a, b| a.photo.cmp(&b.photo));
    log::info!("Found {} pair(s) in {}", pairs.len(), dir.display());
    Ok(pairs)
}
