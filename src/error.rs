use std::path::{Path, PathBuf};

use crate::motion::xmp::XmpError;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure the library can report.
///
/// Variants fall into two tiers. Pre-flight problems ([`Error::is_fatal`])
/// abort a whole run; everything else belongs to a single photo/video pair
/// and only causes that pair to be skipped.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Directory does not exist: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("Path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Recursive directory traversal is not implemented")]
    RecursionNotImplemented,

    #[error("Both --photo and --video are required together (missing --{missing})")]
    IncompletePair { missing: &'static str },

    #[error("No input given: pass --dir, or both --photo and --video")]
    NoInput,

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JPEG {}: {reason}", .path.display())]
    Jpeg { path: PathBuf, reason: String },

    #[error("XMP error: {0}")]
    Xmp(#[from] XmpError),

    #[error("Video offset {offset} is out of range for {} ({size} bytes)", .path.display())]
    OffsetOutOfRange {
        path: PathBuf,
        offset: u64,
        size: u64,
    },

    #[error("Output {} would overwrite an input file", .0.display())]
    OutputOverwritesInput(PathBuf),

    #[error("Not a motion photo: {}", .0.display())]
    NotAMotionPhoto(PathBuf),

    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Wrap an I/O error together with the path it happened on.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub(crate) fn jpeg(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        Self::Jpeg {
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
        }
    }

    /// `true` for pre-flight errors that must terminate the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::DirectoryNotFound(_)
                | Self::NotADirectory(_)
                | Self::RecursionNotImplemented
                | Self::IncompletePair { .. }
                | Self::NoInput
                | Self::Config(_)
        )
    }
}
