//! Output file lifecycle.
//!
//! Every output (downloaded file or GeoTIFF) is written to a temp file next to
//! the destination and atomically renamed onto it once complete. An
//! `OutputFile` dropped without `commit` closes and deletes its temp file, so
//! a failed operation never leaves a truncated destination behind.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` to the final path (e.g. `file.tif` → `file.tif.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// Scoped handle on an output being written.
#[derive(Debug)]
pub struct OutputFile {
    file: Option<File>,
    temp_path: PathBuf,
    final_path: PathBuf,
}

impl OutputFile {
    /// Create (or truncate) the temp file for `final_path`.
    pub fn create(final_path: &Path) -> io::Result<Self> {
        let temp_path = temp_path(final_path);
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;
        Ok(OutputFile {
            file: Some(file),
            temp_path,
            final_path: final_path.to_path_buf(),
        })
    }

    /// The open temp file. Writes go here until `commit`.
    pub fn file_mut(&mut self) -> io::Result<&mut File> {
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "output file already closed"))
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    pub fn final_path(&self) -> &Path {
        &self.final_path
    }

    /// Flush, fsync and rename the temp file onto the final path.
    /// Overwrites an existing destination.
    pub fn commit(mut self) -> io::Result<()> {
        if let Some(mut file) = self.file.take() {
            file.flush()?;
            file.sync_all()?;
        }
        std::fs::rename(&self.temp_path, &self.final_path)?;
        // Renamed: nothing left for Drop to clean up.
        self.temp_path.clear();
        Ok(())
    }
}

impl Drop for OutputFile {
    fn drop(&mut self) {
        drop(self.file.take());
        if self.temp_path.as_os_str().is_empty() {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.temp_path) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!("failed to remove {}: {}", self.temp_path.display(), e);
            }
        } else {
            tracing::debug!("removed incomplete output {}", self.temp_path.display());
        }
    }
}
