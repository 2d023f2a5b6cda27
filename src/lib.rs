//! # motion-muxer
//!
//! Build Google Camera style motion photos: append a MOV/MP4 clip to a JPEG and
//! record where the clip starts in the JPEG's XMP (`GCamera:MicroVideo*` tags).
//! Directories can be processed in bulk by pairing `name.jpg` with `name.mov`
//! or `name.mp4`.
//!
//! ## Quick Start
//!
//! The pipeline module handles the full validate → merge → tag flow:
//!
//! ```rust,no_run
//! use motion_muxer::config::Config;
//! use motion_muxer::pipeline::{self, RunMode};
//! use std::path::PathBuf;
//!
//! fn main() -> motion_muxer::Result<()> {
//!     let mut config = Config::default();
//!     config.output_dir = PathBuf::from("motion");
//!     config.copy_all = true;
//!
//!     let mode = RunMode::resolve(Some(PathBuf::from("./camera-roll")), None, None)?;
//!     let report = pipeline::run(&mode, &config)?;
//!
//!     for outcome in &report.converted {
//!         println!("{} (video at -{} bytes)", outcome.output.display(), outcome.offset);
//!     }
//!     for failure in &report.failed {
//!         eprintln!("Error processing {}: {}", failure.photo.display(), failure.error);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Lower-Level Usage
//!
//! ```rust,no_run
//! use motion_muxer::motion::{MicroVideo, add_xmp_metadata, merge_files, read_motion_photo};
//! use std::path::Path;
//!
//! fn main() -> motion_muxer::Result<()> {
//!     let photo = Path::new("IMG_0001.jpg");
//!     let video = Path::new("IMG_0001.mov");
//!
//!     // 1. Concatenate photo and clip
//!     let merged = merge_files(photo, video, Path::new("out"))?;
//!
//!     // 2. Tag it. The offset counts back from the end of the file.
//!     let offset = std::fs::metadata(video).map_err(|e| motion_muxer::Error::io(video, e))?.len();
//!     add_xmp_metadata(&merged, &MicroVideo::new(offset))?;
//!
//!     // 3. Read it back
//!     let info = read_motion_photo(&merged)?;
//!     println!("Video starts at byte {}", info.video_start());
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Run configuration and JSON loading/saving
//! - [`error`]: Crate error type
//! - [`validate`]: Existence and extension checks
//! - [`pairing`]: Photo/video pair discovery
//! - [`motion`]: Merging, XMP tagging, read-back and extraction
//! - [`pipeline`]: Single-pair and directory runs, copy-through of leftovers

pub mod config;
pub mod error;
pub mod motion;
pub mod pairing;
pub mod pipeline;
pub mod validate;

pub use error::{Error, Result};
