use img_parts::Bytes;
use img_parts::jpeg::{Jpeg, JpegSegment, markers};

use super::xmp::XmpError;

/// Identifier that prefixes a standard XMP packet inside an APP1 segment.
pub const XMP_HEADER: &[u8] = b"http://ns.adobe.com/xap/1.0/\0";

const RST0: u8 = 0xD0;
const RST7: u8 = 0xD7;
const TEM: u8 = 0x01;

/// Largest payload a JPEG segment can carry (u16 length minus its own 2 bytes).
const MAX_SEGMENT_CONTENTS: usize = u16::MAX as usize - 2;

/// Problems found while walking raw JPEG marker structure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    #[error("missing SOI marker")]
    MissingSoi,
    #[error("expected a marker at byte {0}")]
    ExpectedMarker(usize),
    #[error("data ends inside a segment at byte {0}")]
    Truncated(usize),
}

/// A metadata segment from the region before the first scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderSegment<'a> {
    pub marker: u8,
    pub contents: &'a [u8],
}

fn is_standalone(marker: u8) -> bool {
    matches!(marker, RST0..=RST7 | TEM)
}

/// Read the next marker at `pos`, skipping fill bytes.
/// Returns the marker and the position right after it.
fn next_marker(data: &[u8], mut pos: usize) -> Result<(u8, usize), ScanError> {
    if data.get(pos) != Some(&0xFF) {
        return Err(if pos >= data.len() {
            ScanError::Truncated(pos)
        } else {
            ScanError::ExpectedMarker(pos)
        });
    }
    while data.get(pos) == Some(&0xFF) {
        pos += 1;
    }
    let marker = *data.get(pos).ok_or(ScanError::Truncated(pos))?;
    Ok((marker, pos + 1))
}

/// Length-prefixed segment body starting at `pos` (just after the marker).
/// Returns the body and the position after it.
fn segment_body(data: &[u8], pos: usize) -> Result<(&[u8], usize), ScanError> {
    let len_bytes = data.get(pos..pos + 2).ok_or(ScanError::Truncated(pos))?;
    let len = u16::from_be_bytes([len_bytes[0], len_bytes[1]]) as usize;
    if len < 2 {
        return Err(ScanError::Truncated(pos));
    }
    let end = pos + len;
    let body = data.get(pos + 2..end).ok_or(ScanError::Truncated(pos))?;
    Ok((body, end))
}

/// Skip entropy-coded data after SOS. Returns the position of the next real marker.
fn skip_entropy(data: &[u8], mut pos: usize) -> Result<usize, ScanError> {
    while pos + 1 < data.len() {
        if data[pos] != 0xFF {
            pos += 1;
            continue;
        }
        match data[pos + 1] {
            // stuffed byte or restart marker, both part of the scan
            0x00 | RST0..=RST7 => pos += 2,
            // fill byte, the marker follows
            0xFF => pos += 1,
            _ => return Ok(pos),
        }
    }
    Err(ScanError::Truncated(pos))
}

/// Metadata segments between SOI and the first SOS.
///
/// Trailing data after the image (an appended video, for instance) is never
/// touched, so this works on complete motion photos.
pub fn header_segments(data: &[u8]) -> Result<Vec<HeaderSegment<'_>>, ScanError> {
    if !data.starts_with(&[0xFF, markers::SOI]) {
        return Err(ScanError::MissingSoi);
    }
    let mut segments = Vec::new();
    let mut pos = 2;
    loop {
        let (marker, after) = next_marker(data, pos)?;
        if marker == markers::SOS || marker == markers::EOI {
            return Ok(segments);
        }
        if is_standalone(marker) {
            pos = after;
            continue;
        }
        let (contents, end) = segment_body(data, after)?;
        segments.push(HeaderSegment { marker, contents });
        pos = end;
    }
}

/// Number of bytes from SOI through EOI of the JPEG at the start of `data`.
///
/// Anything after the returned length is not part of the image.
pub fn jpeg_extent(data: &[u8]) -> Result<usize, ScanError> {
    if !data.starts_with(&[0xFF, markers::SOI]) {
        return Err(ScanError::MissingSoi);
    }
    let mut pos = 2;
    loop {
        let (marker, after) = next_marker(data, pos)?;
        if marker == markers::EOI {
            return Ok(after);
        }
        if is_standalone(marker) {
            pos = after;
            continue;
        }
        let (_, end) = segment_body(data, after)?;
        pos = if marker == markers::SOS {
            skip_entropy(data, end)?
        } else {
            end
        };
    }
}

fn is_xmp(segment: &JpegSegment) -> bool {
    segment.marker() == markers::APP1 && segment.contents().starts_with(XMP_HEADER)
}

/// Find the standard XMP APP1 segment position in a JPEG.
pub fn find_xmp_segment_pos(jpeg: &Jpeg) -> Option<usize> {
    jpeg.segments().iter().position(is_xmp)
}

/// The XMP packet stored in the JPEG, without the APP1 identifier.
pub fn xmp_packet(jpeg: &Jpeg) -> Option<Bytes> {
    find_xmp_segment_pos(jpeg).map(|pos| jpeg.segments()[pos].contents().slice(XMP_HEADER.len()..))
}

/// Replace the XMP packet, or insert one after the leading APP0/APP1 run.
pub fn set_xmp_packet(jpeg: &mut Jpeg, packet: &[u8]) -> Result<(), XmpError> {
    let size = XMP_HEADER.len() + packet.len();
    if size > MAX_SEGMENT_CONTENTS {
        return Err(XmpError::PacketTooLarge(packet.len()));
    }

    let mut contents = Vec::with_capacity(size);
    contents.extend_from_slice(XMP_HEADER);
    contents.extend_from_slice(packet);
    let new_segment = JpegSegment::new_with_contents(markers::APP1, Bytes::from(contents));

    let xmp_pos = find_xmp_segment_pos(jpeg);
    let segments = jpeg.segments_mut();
    match xmp_pos {
        Some(pos) => segments[pos] = new_segment,
        None => {
            let insert_pos = segments
                .iter()
                .position(|s| s.marker() != markers::APP0 && s.marker() != markers::APP1)
                .unwrap_or(segments.len());
            segments.insert(insert_pos, new_segment);
        }
    }
    Ok(())
}
