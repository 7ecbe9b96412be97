//! GeoTIFF writer for in-memory arrays.
//!
//! Writes classic TIFF with one pixel-interleaved `f32` strip per image
//! directory, GeoTIFF 1.0 georeferencing tags, and `GDAL_NODATA`. Optional
//! overview levels follow the full-resolution image as reduced-resolution
//! IFDs (`NewSubfileType = 1`).
//!
//! # Example
//!
//! ```rust,no_run
//! use geofetch_core::raster::{Compression, GeoTiffWriter};
//! use ndarray::Array2;
//!
//! let elevation = Array2::<f32>::zeros((180, 360));
//! GeoTiffWriter::new(elevation.view().into_dyn())?
//!     .origin(-180.0, 90.0)
//!     .pixel_size(1.0, 1.0)
//!     .epsg(4326)
//!     .compression(Compression::Deflate)
//!     .overviews(&[2, 4, 8, 16])
//!     .write("elevation.tif")?;
//! # Ok::<(), geofetch_core::raster::RasterError>(())
//! ```

use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use flate2::write::ZlibEncoder;
use ndarray::{ArrayView3, ArrayViewD, Axis, Ix3};
use serde::{Deserialize, Serialize};
use tiff::encoder::{DirectoryEncoder, TiffEncoder, TiffKind};
use tiff::tags::Tag;

use super::{geokeys, overview, Crs, GeoTransform, PixelHeightSign, RasterError};
use crate::storage::OutputFile;

// GeoTIFF / GDAL tag IDs
const MODEL_PIXEL_SCALE_TAG: u16 = 33550;
const MODEL_TIEPOINT_TAG: u16 = 33922;
const MODEL_TRANSFORMATION_TAG: u16 = 34264;
const GEO_KEY_DIRECTORY_TAG: u16 = 34735;
const GDAL_NODATA_TAG: u16 = 42113;

const COMPRESSION_NONE: u16 = 1;
const COMPRESSION_LZW: u16 = 5;
const COMPRESSION_DEFLATE: u16 = 8;
const PHOTOMETRIC_BLACK_IS_ZERO: u16 = 1;
const PLANAR_CHUNKY: u16 = 1;
const SAMPLE_FORMAT_IEEE_FLOAT: u16 = 3;
const EXTRA_SAMPLE_UNSPECIFIED: u16 = 0;
const SUBFILE_REDUCED_RESOLUTION: u32 = 1;

/// Lossless strip compression for GeoTIFF output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    None,
    /// TIFF LZW (compression 5), MSB-first codes with early change
    Lzw,
    /// zlib (Adobe Deflate, TIFF compression 8)
    Deflate,
}

/// `GDAL_NODATA` text for a nodata value (`nan` for NaN).
pub fn format_nodata(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "inf" } else { "-inf" }.to_string()
    } else {
        format!("{value}")
    }
}

/// Plain-parameter form of a write, matching the builder's defaults.
#[derive(Debug, Clone)]
pub struct WriteParams {
    /// X of the upper-left corner of the upper-left pixel.
    pub top_left_x: f64,
    /// Y of the upper-left corner of the upper-left pixel.
    pub top_left_y: f64,
    pub pixel_width: f64,
    pub pixel_height: f64,
    pub pixel_height_sign: PixelHeightSign,
    pub epsg: u32,
    pub nodata: f64,
    pub compression: Compression,
    /// Overview decimation factors; empty for none.
    pub overview_factors: Vec<u32>,
}

impl Default for WriteParams {
    fn default() -> Self {
        Self {
            top_left_x: 0.0,
            top_left_y: 0.0,
            pixel_width: 1.0,
            pixel_height: 1.0,
            pixel_height_sign: PixelHeightSign::NorthUp,
            epsg: 4326,
            nodata: f64::NAN,
            compression: Compression::None,
            overview_factors: Vec::new(),
        }
    }
}

/// Writes a 2-D or 3-D array to `path` as a GeoTIFF.
pub fn write(
    data: ArrayViewD<'_, f32>,
    path: impl AsRef<Path>,
    params: &WriteParams,
) -> Result<(), RasterError> {
    GeoTiffWriter::new(data)?
        .origin(params.top_left_x, params.top_left_y)
        .pixel_size(params.pixel_width, params.pixel_height)
        .pixel_height_sign(params.pixel_height_sign)
        .epsg(params.epsg)
        .nodata(params.nodata)
        .compression(params.compression)
        .overviews(&params.overview_factors)
        .write(path)
}

/// Builder for configuring GeoTIFF output.
pub struct GeoTiffWriter<'a> {
    data: ArrayView3<'a, f32>,
    origin: (f64, f64),
    pixel_size: (f64, f64),
    pixel_height_sign: PixelHeightSign,
    geo_transform: Option<GeoTransform>,
    epsg: Option<u32>,
    nodata: Option<f64>,
    compression: Compression,
    overview_factors: Vec<u32>,
}

impl<'a> GeoTiffWriter<'a> {
    /// Infers the band layout from the array rank: 3-D is
    /// `(bands, rows, cols)`, 2-D is a single band `(rows, cols)`.
    pub fn new(data: ArrayViewD<'a, f32>) -> Result<Self, RasterError> {
        let data = match data.ndim() {
            3 => data.into_dimensionality::<Ix3>(),
            2 => data.insert_axis(Axis(0)).into_dimensionality::<Ix3>(),
            n => {
                return Err(RasterError::Shape(format!(
                    "expected a 2-D or 3-D array, got {n} dimensions"
                )))
            }
        }
        .map_err(|e| RasterError::Shape(e.to_string()))?;
        Ok(Self::from_bands(data))
    }

    /// Builder over an array already shaped `(bands, rows, cols)`.
    pub fn from_bands(data: ArrayView3<'a, f32>) -> Self {
        Self {
            data,
            origin: (0.0, 0.0),
            pixel_size: (1.0, 1.0),
            pixel_height_sign: PixelHeightSign::default(),
            geo_transform: None,
            epsg: None,
            nodata: Some(f64::NAN),
            compression: Compression::default(),
            overview_factors: Vec::new(),
        }
    }

    /// Upper-left corner of the upper-left pixel.
    #[must_use]
    pub fn origin(mut self, x: f64, y: f64) -> Self {
        self.origin = (x, y);
        self
    }

    /// Pixel width and height in CRS units; the height's sign is governed
    /// by [`pixel_height_sign`](Self::pixel_height_sign).
    #[must_use]
    pub fn pixel_size(mut self, width: f64, height: f64) -> Self {
        self.pixel_size = (width, height);
        self
    }

    #[must_use]
    pub fn pixel_height_sign(mut self, sign: PixelHeightSign) -> Self {
        self.pixel_height_sign = sign;
        self
    }

    /// Explicit transform; overrides origin, pixel size and sign.
    #[must_use]
    pub fn geo_transform(mut self, geo_transform: GeoTransform) -> Self {
        self.geo_transform = Some(geo_transform);
        self
    }

    #[must_use]
    pub fn epsg(mut self, code: u32) -> Self {
        self.epsg = Some(code);
        self
    }

    /// Nodata sentinel tagged on every band (default NaN).
    #[must_use]
    pub fn nodata(mut self, value: f64) -> Self {
        self.nodata = Some(value);
        self
    }

    /// Write no `GDAL_NODATA` tag.
    #[must_use]
    pub fn clear_nodata(mut self) -> Self {
        self.nodata = None;
        self
    }

    #[must_use]
    pub fn compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Overview decimation factors; factors below 2 are ignored.
    #[must_use]
    pub fn overviews(mut self, factors: &[u32]) -> Self {
        self.overview_factors = factors.to_vec();
        self
    }

    /// Transform that will be written.
    pub fn resolved_geo_transform(&self) -> GeoTransform {
        self.geo_transform.unwrap_or_else(|| {
            GeoTransform::from_origin(
                self.origin.0,
                self.origin.1,
                self.pixel_size.0,
                self.pixel_size.1,
                self.pixel_height_sign,
            )
        })
    }

    /// Write to a file path. The file appears only once fully written.
    pub fn write<P: AsRef<Path>>(self, path: P) -> Result<(), RasterError> {
        let path = path.as_ref();
        let create_err = |source| RasterError::Create {
            path: path.to_path_buf(),
            source,
        };

        let mut out = OutputFile::create(path).map_err(create_err)?;
        {
            let mut writer = BufWriter::new(out.file_mut()?);
            self.write_to(&mut writer)?;
            writer.flush()?;
        }
        out.commit().map_err(create_err)?;

        let (bands, rows, cols) = self.data.dim();
        tracing::info!(
            bands,
            rows,
            cols,
            epsg = self.epsg,
            compression = ?self.compression,
            "wrote GeoTIFF {}",
            path.display()
        );
        Ok(())
    }

    /// Write the GeoTIFF into memory.
    pub fn to_bytes(&self) -> Result<Vec<u8>, RasterError> {
        let mut buffer = std::io::Cursor::new(Vec::new());
        self.write_to(&mut buffer)?;
        Ok(buffer.into_inner())
    }

    /// Write to any writer that implements Write + Seek
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<(), RasterError> {
        let (bands, rows, cols) = self.data.dim();
        if bands == 0 || rows == 0 || cols == 0 {
            return Err(RasterError::Empty { bands, rows, cols });
        }
        let crs = self.epsg.map(Crs::from_epsg).transpose()?;
        let geo = GeoTags {
            geo_transform: self.resolved_geo_transform(),
            geokeys: geokeys::encode(crs.as_ref()),
        };

        let mut encoder = TiffEncoder::new(writer)?;
        self.write_image(&mut encoder, self.data, Some(&geo))?;

        for &factor in &self.overview_factors {
            if factor < 2 {
                tracing::warn!(factor, "ignoring overview factor below 2");
                continue;
            }
            if rows < factor as usize && cols < factor as usize {
                tracing::warn!(factor, rows, cols, "skipping overview level larger than the raster");
                continue;
            }
            let reduced = overview::downsample(self.data, factor, self.nodata);
            tracing::debug!(factor, dim = ?reduced.dim(), "writing overview level");
            self.write_image(&mut encoder, reduced.view(), None)?;
        }
        Ok(())
    }

    /// One image directory: full resolution when `geo` is given, overview otherwise.
    fn write_image<W: Write + Seek>(
        &self,
        encoder: &mut TiffEncoder<W>,
        data: ArrayView3<'_, f32>,
        geo: Option<&GeoTags>,
    ) -> Result<(), RasterError> {
        let (bands, rows, cols) = data.dim();
        let width = dimension_u32(cols, "width")?;
        let height = dimension_u32(rows, "height")?;
        let samples_per_pixel = u16::try_from(bands)
            .map_err(|_| RasterError::Shape(format!("{bands} bands exceed the TIFF limit")))?;

        let strip = self.encode_strip(data)?;

        let mut dir = encoder.image_directory()?;
        if geo.is_none() {
            dir.write_tag(Tag::NewSubfileType, SUBFILE_REDUCED_RESOLUTION)?;
        }
        dir.write_tag(Tag::ImageWidth, width)?;
        dir.write_tag(Tag::ImageLength, height)?;
        dir.write_tag(Tag::BitsPerSample, vec![32u16; bands].as_slice())?;
        let compression_tag = match self.compression {
            Compression::None => COMPRESSION_NONE,
            Compression::Lzw => COMPRESSION_LZW,
            Compression::Deflate => COMPRESSION_DEFLATE,
        };
        dir.write_tag(Tag::Compression, compression_tag)?;
        dir.write_tag(Tag::PhotometricInterpretation, PHOTOMETRIC_BLACK_IS_ZERO)?;
        dir.write_tag(Tag::SamplesPerPixel, samples_per_pixel)?;
        dir.write_tag(Tag::RowsPerStrip, height)?;
        dir.write_tag(Tag::PlanarConfiguration, PLANAR_CHUNKY)?;
        dir.write_tag(
            Tag::SampleFormat,
            vec![SAMPLE_FORMAT_IEEE_FLOAT; bands].as_slice(),
        )?;
        if bands > 1 {
            let extra_samples = vec![EXTRA_SAMPLE_UNSPECIFIED; bands - 1];
            dir.write_tag(Tag::ExtraSamples, extra_samples.as_slice())?;
        }

        if let Some(geo) = geo {
            write_geotiff_tags(&mut dir, geo)?;
        }
        if let Some(nodata) = self.nodata {
            dir.write_tag(tag(GDAL_NODATA_TAG), format_nodata(nodata).as_str())?;
        }

        let strip_len = classic_u32(strip.len() as u64)?;
        let strip_offset = classic_u32(dir.write_data(strip.as_slice())?)?;
        dir.write_tag(Tag::StripOffsets, strip_offset)?;
        dir.write_tag(Tag::StripByteCounts, strip_len)?;

        dir.finish()?;
        Ok(())
    }

    /// Pixel-interleaved native-endian `f32` samples, compressed if configured.
    fn encode_strip(&self, data: ArrayView3<'_, f32>) -> Result<Vec<u8>, RasterError> {
        // (bands, rows, cols) -> (rows, cols, bands)
        let interleaved = data.permuted_axes([1, 2, 0]);
        let mut raw = Vec::with_capacity(data.len() * 4);
        for &v in interleaved.iter() {
            raw.extend_from_slice(&v.to_ne_bytes());
        }
        match self.compression {
            Compression::None => Ok(raw),
            Compression::Lzw => weezl::encode::Encoder::with_tiff_size_switch(weezl::BitOrder::Msb, 8)
                .encode(&raw)
                .map_err(|e| RasterError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))),
            Compression::Deflate => {
                let mut z = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
                z.write_all(&raw)?;
                Ok(z.finish()?)
            }
        }
    }
}

struct GeoTags {
    geo_transform: GeoTransform,
    geokeys: geokeys::EncodedGeoKeys,
}

fn tag(code: u16) -> Tag {
    Tag::from_u16_exhaustive(code)
}

/// Byte offsets and counts must fit the 32-bit fields of classic TIFF.
fn classic_u32(value: u64) -> Result<u32, RasterError> {
    u32::try_from(value)
        .map_err(|_| RasterError::Shape("output exceeds the 4 GiB classic TIFF limit".into()))
}

fn dimension_u32(len: usize, name: &str) -> Result<u32, RasterError> {
    u32::try_from(len).map_err(|_| RasterError::Shape(format!("{name} {len} exceeds the TIFF limit")))
}

fn write_geotiff_tags<W: Write + Seek, K: TiffKind>(
    dir: &mut DirectoryEncoder<'_, W, K>,
    geo: &GeoTags,
) -> Result<(), RasterError> {
    match geo.geo_transform.to_tiepoint_and_scale() {
        Some((tiepoint, scale)) => {
            dir.write_tag(tag(MODEL_PIXEL_SCALE_TAG), scale.as_slice())?;
            dir.write_tag(tag(MODEL_TIEPOINT_TAG), tiepoint.as_slice())?;
        }
        None => {
            let matrix = geo.geo_transform.to_model_transformation();
            dir.write_tag(tag(MODEL_TRANSFORMATION_TAG), matrix.as_slice())?;
        }
    }

    dir.write_tag(tag(GEO_KEY_DIRECTORY_TAG), geo.geokeys.directory.as_slice())?;
    if let Some(ascii) = &geo.geokeys.ascii_params {
        dir.write_tag(tag(geokeys::GEO_ASCII_PARAMS_TAG), ascii.as_str())?;
    }
    Ok(())
}
