use img_parts::Bytes;
use img_parts::jpeg::Jpeg;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use super::jpeg::{jpeg_extent, set_xmp_packet, xmp_packet};
use super::xmp::{NS_GCAMERA, XmpError, XmpPacket};
use crate::config::DEFAULT_PRESENTATION_TIMESTAMP_US;
use crate::error::{Error, Result};

/// Prefix the Google Camera namespace is registered under.
pub const GCAMERA_PREFIX: &str = "GCamera";

/// Highest numeric suffix tried when `GCamera` is bound to another URI.
const MAX_PREFIX_SUFFIX: u32 = 9;

pub const TAG_MICRO_VIDEO: &str = "MicroVideo";
pub const TAG_MICRO_VIDEO_VERSION: &str = "MicroVideoVersion";
pub const TAG_MICRO_VIDEO_OFFSET: &str = "MicroVideoOffset";
pub const TAG_MICRO_VIDEO_PRESENTATION_TIMESTAMP_US: &str = "MicroVideoPresentationTimestampUs";

/// The four Micro Video tags written into a motion photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MicroVideo {
    /// Bytes from end of file back to the first byte of the video.
    pub offset: u64,
    pub presentation_timestamp_us: u64,
}

impl MicroVideo {
    pub fn new(offset: u64) -> Self {
        Self {
            offset,
            presentation_timestamp_us: DEFAULT_PRESENTATION_TIMESTAMP_US,
        }
    }
}

/// Write the Micro Video XMP tags into a merged photo+video file, in place.
///
/// Only the JPEG header segments change. The region after the JPEG's EOI,
/// which holds the video, is copied through untouched, so `offset` (counted
/// from the end of the file) stays valid after the header grows.
pub fn add_xmp_metadata(merged: &Path, tags: &MicroVideo) -> Result<()> {
    let data = fs::read(merged).map_err(|e| Error::io(merged, e))?;
    let size = data.len() as u64;
    if tags.offset > size {
        return Err(Error::OffsetOutOfRange {
            path: merged.to_path_buf(),
            offset: tags.offset,
            size,
        });
    }

    // The JPEG lies somewhere before the video; find exactly where it ends so
    // an older appended payload is kept as opaque trailer too.
    let video_start = (size - tags.offset) as usize;
    let jpeg_end =
        jpeg_extent(&data[..video_start]).map_err(|e| Error::jpeg(merged, e.to_string()))?;
    let trailer = &data[jpeg_end..];

    let mut jpeg = Jpeg::from_bytes(Bytes::copy_from_slice(&data[..jpeg_end]))
        .map_err(|e| Error::jpeg(merged, e.to_string()))?;

    log::info!("Reading existing metadata from file.");
    let mut packet = load_packet(&jpeg)?;
    warn_on_existing_keys(merged, &packet);
    register_gcamera(&mut packet)?;

    packet.set_property(NS_GCAMERA, TAG_MICRO_VIDEO, 1)?;
    packet.set_property(NS_GCAMERA, TAG_MICRO_VIDEO_VERSION, 1)?;
    packet.set_property(NS_GCAMERA, TAG_MICRO_VIDEO_OFFSET, tags.offset)?;
    packet.set_property(
        NS_GCAMERA,
        TAG_MICRO_VIDEO_PRESENTATION_TIMESTAMP_US,
        tags.presentation_timestamp_us,
    )?;

    set_xmp_packet(&mut jpeg, &packet.to_bytes()?)?;
    let header = jpeg.encoder().bytes();

    write_atomic(merged, &[&header[..], trailer])?;
    log::info!(
        "Wrote Micro Video metadata to {} (offset {})",
        merged.display(),
        tags.offset
    );
    Ok(())
}

/// The photo's XMP packet, or an empty one when it has none.
fn load_packet(jpeg: &Jpeg) -> Result<XmpPacket> {
    Ok(match xmp_packet(jpeg) {
        Some(existing) => XmpPacket::parse(&existing)?,
        None => XmpPacket::new(),
    })
}

/// Log the existing XMP keys. Returns `true` when any were found, which the
/// user is warned about since overlapping keys get overwritten.
fn warn_on_existing_keys(path: &Path, packet: &XmpPacket) -> bool {
    let keys = packet.keys();
    log::info!("Found XMP keys: {keys:?}");
    if keys.is_empty() {
        return false;
    }
    log::warn!(
        "Found existing XMP keys in {}. They *may* be affected after this process.",
        path.display()
    );
    true
}

/// Bind the Google Camera namespace, returning the prefix it ends up under.
///
/// An already bound namespace is reused. If `GCamera` is taken by another
/// URI, `GCamera1`, `GCamera2`, ... are tried instead.
fn register_gcamera(packet: &mut XmpPacket) -> Result<String> {
    let mut last_err = None;
    for n in 0..=MAX_PREFIX_SUFFIX {
        let prefix = match n {
            0 => GCAMERA_PREFIX.to_string(),
            n => format!("{GCAMERA_PREFIX}{n}"),
        };
        match packet.register_namespace(NS_GCAMERA, &prefix) {
            Ok(()) => return Ok(prefix),
            Err(XmpError::NamespaceAlreadyRegistered { prefix, .. }) => {
                log::warn!("Namespace {NS_GCAMERA} already registered as {prefix}, continuing");
                return Ok(prefix);
            }
            Err(e @ XmpError::PrefixConflict { .. }) => {
                log::warn!("{e}, trying another prefix");
                last_err = Some(e);
            }
            Err(e) => return Err(e.into()),
        }
    }
    Err(last_err
        .unwrap_or_else(|| XmpError::UnknownNamespace(NS_GCAMERA.to_string()))
        .into())
}

/// Replace `path` with the concatenation of `parts` via a sibling temp file.
fn write_atomic(path: &Path, parts: &[&[u8]]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| Error::io(dir, e))?;
    for part in parts {
        tmp.write_all(part).map_err(|e| Error::io(path, e))?;
    }
    tmp.flush().map_err(|e| Error::io(path, e))?;
    tmp.persist(path).map_err(|e| Error::io(path, e.error))?;
    Ok(())
}
