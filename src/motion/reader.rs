use img_parts::jpeg::markers;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use super::jpeg::{XMP_HEADER, header_segments};
use super::writer::{
    TAG_MICRO_VIDEO, TAG_MICRO_VIDEO_OFFSET, TAG_MICRO_VIDEO_PRESENTATION_TIMESTAMP_US,
    TAG_MICRO_VIDEO_VERSION,
};
use super::xmp::{NS_GCAMERA, XmpPacket};
use crate::error::{Error, Result};

/// Micro Video tags found in a motion photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MotionPhotoInfo {
    pub micro_video: bool,
    pub version: Option<u32>,
    /// Bytes from end of file back to the first byte of the video.
    pub offset: u64,
    pub presentation_timestamp_us: Option<u64>,
    pub file_size: u64,
}

impl MotionPhotoInfo {
    /// Absolute position of the first video byte.
    pub fn video_start(&self) -> u64 {
        self.file_size - self.offset
    }
}

/// Read the Micro Video tags from a motion photo.
pub fn read_motion_photo(path: &Path) -> Result<MotionPhotoInfo> {
    let data = fs::read(path).map_err(|e| Error::io(path, e))?;
    let file_size = data.len() as u64;

    let segments = header_segments(&data).map_err(|e| Error::jpeg(path, e.to_string()))?;
    let xmp = segments
        .iter()
        .find(|s| s.marker == markers::APP1 && s.contents.starts_with(XMP_HEADER))
        .ok_or_else(|| Error::NotAMotionPhoto(path.to_path_buf()))?;
    let packet = XmpPacket::parse(&xmp.contents[XMP_HEADER.len()..])?;

    let micro_video = packet.property(NS_GCAMERA, TAG_MICRO_VIDEO) == Some("1");
    let offset = packet
        .property(NS_GCAMERA, TAG_MICRO_VIDEO_OFFSET)
        .and_then(|v| v.trim().parse::<u64>().ok());
    let Some(offset) = offset.filter(|_| micro_video) else {
        return Err(Error::NotAMotionPhoto(path.to_path_buf()));
    };
    if offset > file_size {
        return Err(Error::OffsetOutOfRange {
            path: path.to_path_buf(),
            offset,
            size: file_size,
        });
    }

    Ok(MotionPhotoInfo {
        micro_video,
        version: packet
            .property(NS_GCAMERA, TAG_MICRO_VIDEO_VERSION)
            .and_then(|v| v.trim().parse().ok()),
        offset,
        presentation_timestamp_us: packet
            .property(NS_GCAMERA, TAG_MICRO_VIDEO_PRESENTATION_TIMESTAMP_US)
            .and_then(|v| v.trim().parse().ok()),
        file_size,
    })
}

/// Copy the last `length` bytes of `input` into `output`.
fn copy_from_end<R: Read + Seek, W: Write>(
    input: &mut R,
    output: &mut W,
    length: u64,
) -> io::Result<u64> {
    let back = i64::try_from(length).map_err(io::Error::other)?;
    input.seek(SeekFrom::End(-back))?;
    io::copy(&mut input.take(length), output)
}

/// Write the embedded video of a motion photo to `dest`. Returns bytes written.
pub fn extract_video(path: &Path, dest: &Path) -> Result<u64> {
    let info = read_motion_photo(path)?;

    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    let mut input = File::open(path).map_err(|e| Error::io(path, e))?;
    let out = File::create(dest).map_err(|e| Error::io(dest, e))?;
    let mut writer = BufWriter::new(out);

    let written =
        copy_from_end(&mut input, &mut writer, info.offset).map_err(|e| Error::io(path, e))?;
    writer.flush().map_err(|e| Error::io(dest, e))?;

    log::info!(
        "Extracted {written} video bytes from {} to {}",
        path.display(),
        dest.display()
    );
    Ok(written)
}
