//! FTP fetch error type.

use std::io;
use std::path::PathBuf;

use crate::ftp_url::FtpUrlError;

/// Failure of a single FTP retrieval. Nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The URL could not be split into host, credentials and path.
    #[error(transparent)]
    Url(#[from] FtpUrlError),
    /// The host part cannot form a URL for libcurl.
    #[error("invalid FTP host: {0}")]
    Host(#[from] url::ParseError),
    /// Connection, login, or remote-file failure reported by libcurl.
    #[error("FTP transfer failed: {0}")]
    Transport(#[from] curl::Error),
    /// Local destination could not be created, written or renamed.
    #[error("local file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FetchError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        FetchError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for errors raised by the FTP session (connect, auth, missing file).
    pub fn is_transport(&self) -> bool {
        matches!(self, FetchError::Transport(_))
    }
}
