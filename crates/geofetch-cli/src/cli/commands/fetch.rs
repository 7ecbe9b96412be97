//! `geofetch fetch` – download one file over FTP.

use anyhow::{Context, Result};
use geofetch_core::config::GeofetchConfig;
use geofetch_core::fetch::{self, FetchOptions};
use std::path::Path;

/// Download `url` into `output_dir` and print the saved path.
pub fn run_fetch(cfg: &GeofetchConfig, url: &str, output_dir: &Path) -> Result<()> {
    let options = FetchOptions::from(&cfg.ftp);
    // The URL carries the password; keep it out of the error chain.
    let saved = fetch::fetch_url(url, output_dir, &options).context("FTP download failed")?;
    println!("{}", saved.display());
    Ok(())
}
