//! Existence and extension checks for inputs.
//!
//! Only file extensions are inspected; file signatures are not.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Accepted still-photo extensions (compared case-insensitively).
pub const PHOTO_EXTENSIONS: &[&str] = &["jpg", "jpeg"];

/// Accepted video extensions (compared case-insensitively).
pub const VIDEO_EXTENSIONS: &[&str] = &["mov", "mp4"];

/// The role a file can play in a motion photo, determined by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// JPEG still
    Photo,
    /// MOV/MP4 clip
    Video,
}

impl MediaKind {
    /// Determine the media kind from a file path extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        if PHOTO_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Photo)
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Video)
        } else {
            None
        }
    }
}

/// A single reason a photo/video pair cannot be converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaIssue {
    PhotoMissing(PathBuf),
    VideoMissing(PathBuf),
    PhotoNotJpeg(PathBuf),
    VideoNotMovOrMp4(PathBuf),
}

impl fmt::Display for MediaIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PhotoMissing(p) => write!(f, "Photo does not exist: {}", p.display()),
            Self::VideoMissing(p) => write!(f, "Video does not exist: {}", p.display()),
            Self::PhotoNotJpeg(p) => write!(f, "Photo isn't a JPEG: {}", p.display()),
            Self::VideoNotMovOrMp4(p) => write!(f, "Video isn't a MOV or MP4: {}", p.display()),
        }
    }
}

/// Pre-flight check for directory mode.
pub fn validate_directory(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(Error::DirectoryNotFound(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(Error::NotADirectory(path.to_path_buf()));
    }
    Ok(())
}

/// Run every media check and return all problems found.
///
/// Checks are not short-circuited: a pair that is both missing and
/// misnamed reports both issues.
pub fn check_media(photo: &Path, video: &Path) -> Vec<MediaIssue> {
    let mut issues = Vec::new();
    if !photo.exists() {
        issues.push(MediaIssue::PhotoMissing(photo.to_path_buf()));
    }
    if !video.exists() {
        issues.push(MediaIssue::VideoMissing(video.to_path_buf()));
    }
    if MediaKind::from_path(photo) != Some(MediaKind::Photo) {
        issues.push(MediaIssue::PhotoNotJpeg(photo.to_path_buf()));
    }
    if MediaKind::from_path(video) != Some(MediaKind::Video) {
        issues.push(MediaIssue::VideoNotMovOrMp4(video.to_path_buf()));
    }
    issues
}

/// Log every problem with a pair and report whether it is usable.
pub fn validate_media(photo: &Path, video: &Path) -> bool {
    let issues = check_media(photo, video);
    for issue in &issues {
        log::error!("{issue}");
    }
    issues.is_empty()
}
