use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Microseconds into the clip that the still frame represents.
///
/// Matches a still taken roughly 1.5s into the clip, the way Live Photos are
/// captured. This is a fixed default, not derived from the video.
pub const DEFAULT_PRESENTATION_TIMESTAMP_US: u64 = 1_500_000;

/// Run configuration shared by every stage of the pipeline.
///
/// # Loading
///
/// ```rust,no_run
/// use motion_muxer::config::Config;
///
/// // From a JSON file
/// let config = Config::load("muxer.json".as_ref()).unwrap();
///
/// // Or use defaults and customize
/// let mut config = Config::default();
/// config.copy_all = true;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory that receives merged motion photos (and copied leftovers).
    pub output_dir: PathBuf,
    /// In directory mode, copy files that were not part of a converted pair.
    pub copy_all: bool,
    /// Requested recursive traversal. Not implemented; rejected at run time.
    pub recurse: bool,
    /// Value written to `GCamera:MicroVideoPresentationTimestampUs`.
    pub presentation_timestamp_us: u64,
    /// Resolve and validate pairs without writing anything.
    pub dry_run: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            copy_all: false,
            recurse: false,
            presentation_timestamp_us: DEFAULT_PRESENTATION_TIMESTAMP_US,
            dry_run: false,
        }
    }
}

impl Config {
    /// Load config from the given JSON file. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::warn!(
                "Config file not found at {}. Using defaults.",
                path.display()
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        serde_json::from_str(&contents)
            .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))
    }

    /// Save config as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(path, contents).map_err(|e| Error::io(path, e))?;
        log::info!("Config saved to {}", path.display());
        Ok(())
    }
}
