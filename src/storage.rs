// SPDX-License-Identifier: GPL-3.0-only

//! Output file naming and persistence

use crate::constants::{FRAME_FILE_EXTENSION, FRAME_FILE_PREFIX};
use chrono::{DateTime, Local, Timelike};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File name for frame `index` captured at `timestamp`
///
/// `Frame-00000042--2024-03-05-14-07-09-123456789.jpg`: zero-padded index,
/// then local date and time down to the nanosecond.
pub fn frame_filename(index: u64, timestamp: DateTime<Local>) -> String {
    format!(
        "{}-{:08}--{}-{:02}.{}",
        FRAME_FILE_PREFIX,
        index,
        timestamp.format("%Y-%m-%d-%H-%M-%S"),
        timestamp.nanosecond(),
        FRAME_FILE_EXTENSION
    )
}

/// Create the output directory if it does not exist yet
pub fn ensure_output_dir(dir: &Path) -> std::io::Result<()> {
    if !dir.as_os_str().is_empty() && !dir.exists() {
        std::fs::create_dir_all(dir)?;
        debug!(path = %dir.display(), "Created output directory");
    }
    Ok(())
}

/// Write one frame to `dir`, named from its index and the current time
pub fn write_frame(dir: &Path, index: u64, bytes: &[u8]) -> std::io::Result<PathBuf> {
    let path = dir.join(frame_filename(index, Local::now()));
    write_or_remove(&path, |file| {
        file.write_all(bytes)?;
        file.flush()
    })?;

    debug!(path = %path.display(), bytes = bytes.len(), "Frame written");
    Ok(path)
}

/// Create `path` and fill it with `write`; a failed write leaves no file behind
fn write_or_remove(
    path: &Path,
    write: impl FnOnce(&mut File) -> std::io::Result<()>,
) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    if let Err(err) = write(&mut file) {
        drop(file);
        if let Err(remove_err) = std::fs::remove_file(path) {
            warn!(path = %path.display(), error = %remove_err, "Could not remove partial frame");
        }
        return Err(err);
    }
    Ok(())
}
