//! Logging init (file under XDG state dir, stderr fallback) and the libcurl trace bridge.

use anyhow::Result;
use curl::easy::InfoType;
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,geofetch=debug,geofetch_core=debug";

/// Target for the libcurl protocol trace (`RUST_LOG=geofetch_core::ftp=debug`).
pub const FTP_TRACE_TARGET: &str = "geofetch_core::ftp";

/// Writer that is either a file or stderr (used when file clone fails).
enum FileOrStderr {
    File(std::fs::File),
    Stderr,
}

impl io::Write for FileOrStderr {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            FileOrStderr::File(f) => f.write(buf),
            FileOrStderr::Stderr => io::stderr().lock().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            FileOrStderr::File(f) => f.flush(),
            FileOrStderr::Stderr => io::stderr().lock().flush(),
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Initialize structured logging to `~/.local/state/geofetch/geofetch.log`.
/// On failure (e.g. log dir unwritable), returns Err so the caller can fall back to stderr.
pub fn init_logging() -> Result<()> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("geofetch")?;
    let log_dir = xdg_dirs.get_state_home();

    fs::create_dir_all(&log_dir)?;
    let log_file_path: PathBuf = log_dir.join("geofetch.log");

    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)?;

    struct FileMakeWriter(std::fs::File);

    impl<'a> MakeWriter<'a> for FileMakeWriter {
        type Writer = FileOrStderr;

        fn make_writer(&'a self) -> Self::Writer {
            self.0
                .try_clone()
                .map(FileOrStderr::File)
                .unwrap_or(FileOrStderr::Stderr)
        }
    }

    let writer: BoxMakeWriter = BoxMakeWriter::new(FileMakeWriter(file));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("tracing init: {e}"))?;

    tracing::info!("geofetch logging initialized at {}", log_file_path.display());

    Ok(())
}

/// Initialize logging to stderr only (no file). Use when init_logging() fails so the CLI doesn't crash.
pub fn init_logging_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}

/// libcurl debug callback: forwards the verbose FTP dialogue to `tracing`
/// instead of stderr. Transfer payloads are dropped and the password masked.
pub fn curl_trace(kind: InfoType, data: &[u8]) {
    if let Some((direction, line)) = curl_trace_line(kind, data) {
        tracing::debug!(target: FTP_TRACE_TARGET, "{direction} {line}");
    }
}

fn curl_trace_line(kind: InfoType, data: &[u8]) -> Option<(&'static str, String)> {
    let direction = match kind {
        InfoType::Text => "*",
        InfoType::HeaderIn => "<",
        InfoType::HeaderOut => ">",
        _ => return None,
    };
    let text = String::from_utf8_lossy(data);
    let text = text.trim_end();
    if text.is_empty() {
        return None;
    }
    let line = match text.get(..5) {
        Some(cmd) if cmd.eq_ignore_ascii_case("PASS ") => "PASS ****".to_string(),
        _ => text.to_string(),
    };
    Some((direction, line))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ftp_commands_and_replies_are_traced() {
        assert_eq!(
            curl_trace_line(InfoType::HeaderOut, b"RETR x.bin\r\n"),
            Some((">", "RETR x.bin".to_string()))
        );
        assert_eq!(
            curl_trace_line(InfoType::HeaderIn, b"226 Transfer complete\r\n"),
            Some(("<", "226 Transfer complete".to_string()))
        );
        assert_eq!(
            curl_trace_line(InfoType::Text, b"Connected to 127.0.0.1\n"),
            Some(("*", "Connected to 127.0.0.1".to_string()))
        );
    }

    #[test]
    fn password_is_masked() {
        let (_, line) = curl_trace_line(InfoType::HeaderOut, b"PASS hunter2\r\n").unwrap();
        assert_eq!(line, "PASS ****");
        let (_, line) = curl_trace_line(InfoType::HeaderOut, b"pass hunter2\r\n").unwrap();
        assert!(!line.contains("hunter2"));
    }

    #[test]
    fn payload_and_blank_lines_are_dropped() {
        assert!(curl_trace_line(InfoType::DataIn, b"\x00\x01binary").is_none());
        assert!(curl_trace_line(InfoType::DataOut, b"x").is_none());
        assert!(curl_trace_line(InfoType::Text, b"\r\n").is_none());
    }
}
