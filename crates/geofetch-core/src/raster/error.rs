use std::io;
use std::path::PathBuf;

/// Error type for GeoTIFF read and write operations.
#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    /// Input path missing or unreadable.
    #[error("cannot open raster {}: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },
    /// Input is not a decodable TIFF.
    #[error("cannot decode raster {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        source: tiff::TiffError,
    },
    /// Output path cannot be created or renamed into place.
    #[error("cannot create raster {}: {source}", path.display())]
    Create { path: PathBuf, source: io::Error },
    /// TIFF encoding error
    #[error("GeoTIFF encoding failed: {0}")]
    Encode(#[from] tiff::TiffError),
    #[error("unrecognized coordinate system EPSG:{0}")]
    UnknownCrs(u32),
    /// Array rank or size not representable.
    #[error("unsupported raster shape: {0}")]
    Shape(String),
    #[error("raster is empty ({bands} bands, {rows} rows, {cols} cols)")]
    Empty {
        bands: usize,
        rows: usize,
        cols: usize,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
}
