//! `geofetch info` – summarize a GeoTIFF.

use anyhow::{Context, Result};
use geofetch_core::raster::{self, RasterInfo};
use std::path::Path;

pub fn run_info(path: &Path, json: bool) -> Result<()> {
    let dataset = raster::read(path)?;
    let info = dataset.info();
    if json {
        let text = serde_json::to_string_pretty(&info).context("serialize raster info")?;
        println!("{text}");
    } else {
        print!("{}", format_info(path, &info));
    }
    Ok(())
}

pub(crate) fn format_info(path: &Path, info: &RasterInfo) -> String {
    let crs = info
        .epsg
        .map(|code| format!("EPSG:{code}"))
        .unwrap_or_else(|| "-".to_string());
    let [c0, c1, c2, c3, c4, c5] = info.geo_transform.coefficients();
    let mut out = String::new();
    out.push_str(&format!("{}\n", path.display()));
    out.push_str(&format!(
        "  size:      {} x {} ({} band{})\n",
        info.width,
        info.height,
        info.bands,
        if info.bands == 1 { "" } else { "s" }
    ));
    out.push_str(&format!("  crs:       {crs}\n"));
    if let Some(proj) = info.proj4 {
        out.push_str(&format!("  proj:      {proj}\n"));
    }
    out.push_str(&format!("  origin:    ({c0}, {c3})\n"));
    out.push_str(&format!("  pixel:     ({c1}, {c5})\n"));
    if c2 != 0.0 || c4 != 0.0 {
        out.push_str(&format!("  rotation:  ({c2}, {c4})\n"));
    }
    out.push_str(&format!(
        "  nodata:    {}\n",
        info.nodata.as_deref().unwrap_or("-")
    ));
    out
}
