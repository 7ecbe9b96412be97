//! `geofetch rewrite` – copy a GeoTIFF with new georeferencing, compression
//! or overviews.

use anyhow::{Context, Result};
use geofetch_core::config::GeofetchConfig;
use geofetch_core::raster::{self, Compression, GeoTransform, PixelHeightSign};
use std::path::Path;

/// Overrides collected from the command line.
#[derive(Debug, Clone, Default)]
pub struct RewriteArgs {
    pub epsg: Option<u32>,
    pub origin: Option<(f64, f64)>,
    pub pixel_size: Option<(f64, f64)>,
    pub as_given_pixel_height: bool,
    pub nodata: Option<f64>,
    pub compression: Option<Compression>,
    pub overviews: bool,
}

pub fn run_rewrite(cfg: &GeofetchConfig, input: &Path, output: &Path, args: &RewriteArgs) -> Result<()> {
    let dataset = raster::read(input)?;
    let geo_transform = resolve_geo_transform(dataset.geo_transform, args);
    let compression = args.compression.unwrap_or(cfg.geotiff.compression);

    let mut writer = dataset
        .geotiff_writer()
        .geo_transform(geo_transform)
        .compression(compression);
    if let Some(code) = args.epsg {
        writer = writer.epsg(code);
    }
    if let Some(nodata) = args.nodata {
        writer = writer.nodata(nodata);
    }
    if args.overviews || cfg.geotiff.overviews {
        writer = writer.overviews(&cfg.geotiff.overview_factors);
    }

    writer
        .write(output)
        .with_context(|| format!("rewrite {} -> {}", input.display(), output.display()))?;
    println!("{}", output.display());
    Ok(())
}

/// New transform from `--origin` / `--pixel-size`; values not given are
/// taken from `existing`. Without either flag `existing` is kept as is.
pub(crate) fn resolve_geo_transform(existing: GeoTransform, args: &RewriteArgs) -> GeoTransform {
    if args.origin.is_none() && args.pixel_size.is_none() {
        return existing;
    }
    if existing.has_rotation() {
        tracing::warn!("dropping rotation terms of the source geotransform");
    }

    let (x, y) = args
        .origin
        .unwrap_or((existing.origin_x(), existing.origin_y()));
    match args.pixel_size {
        Some((w, h)) => {
            let sign = if args.as_given_pixel_height {
                PixelHeightSign::AsGiven
            } else {
                PixelHeightSign::NorthUp
            };
            GeoTransform::from_origin(x, y, w, h, sign)
        }
        // Keep the source pixel height, sign included.
        None => GeoTransform::from_origin(
            x,
            y,
            existing.pixel_width(),
            existing.pixel_height(),
            PixelHeightSign::AsGiven,
        ),
    }
}
