use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{Error, Result};

/// Build the output path for a photo: `output_dir/<photo file name>`.
pub fn output_path_for(photo: &Path, output_dir: &Path) -> Result<PathBuf> {
    let name = photo
        .file_name()
        .ok_or_else(|| Error::io(photo, io::Error::other("photo path has no file name")))?;
    Ok(output_dir.join(name))
}

/// Concatenate the photo and video bytes into `output_dir/<photo name>`.
///
/// Bytes are copied verbatim with no framing. The output is assembled in a
/// temporary file next to the destination and renamed into place once both
/// inputs have been copied, so a failed merge never leaves a partial file
/// under the final name.
pub fn merge_files(photo: &Path, video: &Path, output_dir: &Path) -> Result<PathBuf> {
    log::info!("Merging {} and {}.", photo.display(), video.display());

    let out_path = output_path_for(photo, output_dir)?;
    fs::create_dir_all(output_dir).map_err(|e| Error::io(output_dir, e))?;
    ensure_not_input(&out_path, &[photo, video])?;

    let mut photo_file = File::open(photo).map_err(|e| Error::io(photo, e))?;
    let mut video_file = File::open(video).map_err(|e| Error::io(video, e))?;

    let tmp = NamedTempFile::new_in(output_dir).map_err(|e| Error::io(output_dir, e))?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        io::copy(&mut photo_file, &mut writer).map_err(|e| Error::io(photo, e))?;
        io::copy(&mut video_file, &mut writer).map_err(|e| Error::io(video, e))?;
        writer.flush().map_err(|e| Error::io(&out_path, e))?;
    }
    tmp.persist(&out_path)
        .map_err(|e| Error::io(&out_path, e.error))?;

    log::info!("Merged photo and video into {}.", out_path.display());
    Ok(out_path)
}

/// Refuse to write over one of the inputs.
fn ensure_not_input(out_path: &Path, inputs: &[&Path]) -> Result<()> {
    let Ok(out) = fs::canonicalize(out_path) else {
        // Output doesn't exist yet, so it can't be an input.
        return Ok(());
    };
    for input in inputs {
        if fs::canonicalize(input).is_ok_and(|p| p == out) {
            return Err(Error::OutputOverwritesInput(out_path.to_path_buf()));
        }
    }
    Ok(())
}
