//! GeoTIFF raster I/O.
//!
//! Arrays are `f32` and shaped `(bands, rows, cols)`. Writing goes through
//! [`GeoTiffWriter`] (or [`write`] with [`WriteParams`]); reading returns a
//! [`RasterDataset`] with the pixels and whatever georeferencing the file
//! carries.

mod crs;
mod error;
mod geokeys;
mod geotransform;
mod overview;
mod reader;
mod writer;

use std::path::Path;

use ndarray::{Array3, ArrayView2, Axis};
use serde::Serialize;

pub use crs::Crs;
pub use error::RasterError;
pub use geotransform::{GeoTransform, PixelHeightSign};
pub use reader::{read, read_from};
pub use writer::{format_nodata, write, Compression, GeoTiffWriter, WriteParams};

/// A decoded raster: pixels plus georeferencing.
#[derive(Debug, Clone)]
pub struct RasterDataset {
    /// `(bands, rows, cols)`
    pub data: Array3<f32>,
    pub geo_transform: GeoTransform,
    pub crs: Option<Crs>,
    pub nodata: Option<f64>,
}

impl RasterDataset {
    pub fn bands(&self) -> usize {
        self.data.dim().0
    }

    pub fn rows(&self) -> usize {
        self.data.dim().1
    }

    pub fn cols(&self) -> usize {
        self.data.dim().2
    }

    /// Band `index`, zero-based. Panics if out of range.
    pub fn band(&self, index: usize) -> ArrayView2<'_, f32> {
        self.data.index_axis(Axis(0), index)
    }

    /// Summary suitable for printing or JSON output.
    pub fn info(&self) -> RasterInfo {
        RasterInfo {
            width: self.cols(),
            height: self.rows(),
            bands: self.bands(),
            epsg: self.crs.map(|c| c.epsg),
            proj4: self.crs.and_then(|c| c.proj4),
            geo_transform: self.geo_transform,
            nodata: self.nodata.map(format_nodata),
        }
    }

    /// Writer preloaded with this dataset's pixels and georeferencing.
    pub fn geotiff_writer(&self) -> GeoTiffWriter<'_> {
        let mut writer = GeoTiffWriter::from_bands(self.data.view()).geo_transform(self.geo_transform);
        if let Some(crs) = self.crs {
            writer = writer.epsg(u32::from(crs.epsg));
        }
        match self.nodata {
            Some(value) => writer.nodata(value),
            None => writer.clear_nodata(),
        }
    }

    /// Writes this dataset with its own transform and nodata (no
    /// compression, no overviews). `epsg_override` replaces the stored CRS.
    pub fn write_geotiff(
        &self,
        path: impl AsRef<Path>,
        epsg_override: Option<u32>,
    ) -> Result<(), RasterError> {
        let writer = self.geotiff_writer();
        match epsg_override {
            Some(code) => writer.epsg(code).write(path),
            None => writer.write(path),
        }
    }
}

/// Printable summary of a [`RasterDataset`].
#[derive(Debug, Clone, Serialize)]
pub struct RasterInfo {
    pub width: usize,
    pub height: usize,
    pub bands: usize,
    pub epsg: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proj4: Option<&'static str>,
    pub geo_transform: GeoTransform,
    /// `GDAL_NODATA` text, since NaN has no JSON number form.
    pub nodata: Option<String>,
}
