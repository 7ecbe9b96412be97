//! Single-file FTP download.
//!
//! One libcurl easy handle per call: connect, log in, one binary-mode RETR
//! streamed into the destination's temp file, then an atomic rename. Runs in
//! the calling thread.

mod error;

pub use error::FetchError;

use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::config::FtpConfig;
use crate::logging;
use crate::ftp_url::FtpTarget;
use crate::storage::OutputFile;

/// Per-transfer libcurl settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOptions {
    /// Connect timeout; None leaves libcurl's default in place.
    pub connect_timeout: Option<Duration>,
    /// FTP command/reply trace, sent to the log.
    pub verbose: bool,
}

impl From<&FtpConfig> for FetchOptions {
    fn from(cfg: &FtpConfig) -> Self {
        Self {
            connect_timeout: cfg.connect_timeout_secs.map(Duration::from_secs),
            verbose: cfg.verbose,
        }
    }
}

/// Downloads `target` into `dest`, overwriting any existing file.
/// Returns the number of bytes written.
pub fn download(target: &FtpTarget, dest: &Path, options: &FetchOptions) -> Result<u64, FetchError> {
    let started = Instant::now();
    let transfer_url = target.transfer_url()?;
    let mut out = OutputFile::create(dest).map_err(|e| FetchError::io(dest, e))?;
    let temp_path = out.temp_path().to_path_buf();

    let mut easy = curl::easy::Easy::new();
    easy.url(transfer_url.as_str())?;
    easy.username(&target.username)?;
    easy.password(&target.password)?;
    if let Some(timeout) = options.connect_timeout {
        easy.connect_timeout(timeout)?;
    }
    if options.verbose {
        easy.verbose(true)?;
        easy.debug_function(logging::curl_trace)?;
    }

    let mut written: u64 = 0;
    let mut write_error: Option<io::Error> = None;
    let file = out.file_mut().map_err(|e| FetchError::io(dest, e))?;
    let mut writer = BufWriter::new(file);

    let perform_result = {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| match writer.write_all(data) {
            Ok(()) => {
                written += data.len() as u64;
                Ok(data.len())
            }
            Err(e) => {
                write_error = Some(e);
                // Short count aborts the transfer.
                Ok(0)
            }
        })?;
        // Binary mode (TYPE I) is libcurl's FTP default.
        transfer.perform()
    };

    if let Err(e) = perform_result {
        if e.is_write_error() {
            if let Some(io_err) = write_error.take() {
                return Err(FetchError::io(temp_path, io_err));
            }
        }
        tracing::debug!(host = %target.host, path = %target.remote_path, "FTP transfer failed: {}", e);
        return Err(FetchError::Transport(e));
    }

    writer.flush().map_err(|e| FetchError::io(dest, e))?;
    drop(writer);
    out.commit().map_err(|e| FetchError::io(dest, e))?;

    tracing::info!(
        host = %target.host,
        path = %target.remote_path,
        bytes = written,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "downloaded to {}",
        dest.display()
    );
    Ok(written)
}

/// Parses `url`, downloads the remote file into `output_dir` under its base
/// name, and returns the local path.
pub fn fetch_url(url: &str, output_dir: &Path, options: &FetchOptions) -> Result<PathBuf, FetchError> {
    let target = FtpTarget::parse(url)?;
    std::fs::create_dir_all(output_dir).map_err(|e| FetchError::io(output_dir, e))?;
    let dest = target.local_path(output_dir);
    tracing::debug!(?target, "fetching into {}", dest.display());
    download(&target, &dest, options)?;
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_from_config() {
        let cfg = FtpConfig {
            connect_timeout_secs: Some(15),
            verbose: true,
        };
        let opts = FetchOptions::from(&cfg);
        assert_eq!(opts.connect_timeout, Some(Duration::from_secs(15)));
        assert!(opts.verbose);

        let opts = FetchOptions::from(&FtpConfig::default());
        assert!(opts.connect_timeout.is_none());
        assert!(!opts.verbose);
    }

    #[test]
    fn malformed_url_fails_before_any_io() {
        let dir = tempfile::tempdir().unwrap();
        let err = fetch_url("ftp://host-only/file", dir.path(), &FetchOptions::default())
            .unwrap_err();
        assert!(matches!(err, FetchError::Url(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn unusable_host_fails_before_creating_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = FtpTarget::parse("ftp://u:p@bad host/data.bin").unwrap();
        let dest = dir.path().join("data.bin");
        let err = download(&target, &dest, &FetchOptions::default()).unwrap_err();
        assert!(matches!(err, FetchError::Host(_)), "unexpected error: {err}");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn unreachable_host_is_transport_error_and_leaves_nothing() {
        // Port 1 on loopback: connection refused on any sane test host.
        let dir = tempfile::tempdir().unwrap();
        let opts = FetchOptions {
            connect_timeout: Some(Duration::from_secs(5)),
            verbose: false,
        };
        let err = fetch_url("ftp://u:p@127.0.0.1:1/data.bin", dir.path(), &opts).unwrap_err();
        assert!(err.is_transport(), "unexpected error: {err}");
        assert!(!dir.path().join("data.bin").exists());
        assert!(!dir.path().join("data.bin.part").exists());
    }
}
