//! Motion photo assembly and inspection.
//!
//! - [`merge_files`]: Concatenate a photo and its clip into the output directory
//! - [`add_xmp_metadata`]: Write the Google Camera Micro Video tags into the merged file
//! - [`read_motion_photo`] / [`extract_video`]: Read the tags back and pull the clip out
//!
//! The video always sits at the end of the file, and `GCamera:MicroVideoOffset`
//! counts bytes from the end of the file back to its first byte. Only the JPEG
//! header segments are ever rewritten, so that offset survives the header
//! growing when XMP is added.

pub mod jpeg;
pub mod merge;
pub mod reader;
pub mod writer;
pub mod xmp;

pub use merge::{merge_files, output_path_for};
pub use reader::{MotionPhotoInfo, extract_video, read_motion_photo};
pub use writer::{MicroVideo, add_xmp_metadata};
pub use xmp::{XmpError, XmpPacket};
