//! GeoTIFF reading: full-resolution pixels plus georeferencing tags.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use ndarray::Array3;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;
use tiff::TiffResult;

use super::{geokeys, Crs, GeoTransform, RasterDataset, RasterError};

const MODEL_PIXEL_SCALE_TAG: u16 = 33550;
const MODEL_TIEPOINT_TAG: u16 = 33922;
const MODEL_TRANSFORMATION_TAG: u16 = 34264;
const GEO_KEY_DIRECTORY_TAG: u16 = 34735;
const GDAL_NODATA_TAG: u16 = 42113;

/// Reads every band of the first image in `path`.
pub fn read(path: &Path) -> Result<RasterDataset, RasterError> {
    let file = File::open(path).map_err(|source| RasterError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let dataset = read_from(BufReader::new(file)).map_err(|source| RasterError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(
        bands = dataset.bands(),
        rows = dataset.rows(),
        cols = dataset.cols(),
        epsg = dataset.crs.map(|c| c.epsg),
        "read {}",
        path.display()
    );
    Ok(dataset)
}

/// Decodes a GeoTIFF from any seekable reader.
pub fn read_from<R: Read + Seek>(reader: R) -> TiffResult<RasterDataset> {
    let mut decoder = Decoder::new(reader)?.with_limits(Limits::unlimited());

    let (width, height) = decoder.dimensions()?;
    let (rows, cols) = (height as usize, width as usize);

    let geo_transform = read_geo_transform(&mut decoder)?;
    let crs = decoder
        .find_tag_unsigned_vec::<u16>(tag(GEO_KEY_DIRECTORY_TAG))?
        .and_then(|dir| geokeys::decode_epsg(&dir))
        .map(Crs::from_epsg_lenient);
    let nodata = read_nodata(&mut decoder)?;

    let samples = samples_to_f32(decoder.read_image()?);
    let pixels = rows * cols;
    if pixels == 0 || samples.len() % pixels != 0 {
        return Err(tiff::TiffError::FormatError(
            tiff::TiffFormatError::InconsistentSizesEncountered,
        ));
    }
    let bands = samples.len() / pixels;

    // Decoded samples are pixel-interleaved: (rows, cols, bands).
    let interleaved = Array3::from_shape_vec((rows, cols, bands), samples).map_err(|_| {
        tiff::TiffError::FormatError(tiff::TiffFormatError::InconsistentSizesEncountered)
    })?;
    let data = interleaved
        .permuted_axes([2, 0, 1])
        .as_standard_layout()
        .into_owned();

    Ok(RasterDataset {
        data,
        geo_transform,
        crs,
        nodata,
    })
}

fn tag(code: u16) -> Tag {
    Tag::from_u16_exhaustive(code)
}

fn find_f64_vec<R: Read + Seek>(decoder: &mut Decoder<R>, code: u16) -> TiffResult<Option<Vec<f64>>> {
    decoder
        .find_tag(tag(code))?
        .map(|value| value.into_f64_vec())
        .transpose()
}

fn read_geo_transform<R: Read + Seek>(decoder: &mut Decoder<R>) -> TiffResult<GeoTransform> {
    if let Some(matrix) = find_f64_vec(decoder, MODEL_TRANSFORMATION_TAG)? {
        if let Some(gt) = GeoTransform::from_model_transformation(&matrix) {
            return Ok(gt);
        }
    }
    let tiepoint = find_f64_vec(decoder, MODEL_TIEPOINT_TAG)?;
    let scale = find_f64_vec(decoder, MODEL_PIXEL_SCALE_TAG)?;
    if let (Some(tiepoint), Some(scale)) = (tiepoint, scale) {
        if let Some(gt) = GeoTransform::from_tiepoint_and_scale(&tiepoint, &scale) {
            return Ok(gt);
        }
    }
    tracing::debug!("no georeferencing tags, using identity geotransform");
    Ok(GeoTransform::default())
}

fn read_nodata<R: Read + Seek>(decoder: &mut Decoder<R>) -> TiffResult<Option<f64>> {
    let Some(value) = decoder.find_tag(tag(GDAL_NODATA_TAG))? else {
        return Ok(None);
    };
    let text = value.into_string()?;
    let text = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    match text.parse::<f64>() {
        Ok(v) => Ok(Some(v)),
        Err(_) => {
            tracing::warn!("ignoring unparseable GDAL_NODATA value {:?}", text);
            Ok(None)
        }
    }
}

fn samples_to_f32(image: DecodingResult) -> Vec<f32> {
    match image {
        DecodingResult::U8(data) => data.into_iter().map(|x| x as f32).collect(),
        DecodingResult::U16(data) => data.into_iter().map(|x| x as f32).collect(),
        DecodingResult::U32(data) => data.into_iter().map(|x| x as f32).collect(),
        DecodingResult::U64(data) => data.into_iter().map(|x| x as f32).collect(),
        DecodingResult::I8(data) => data.into_iter().map(|x| x as f32).collect(),
        DecodingResult::I16(data) => data.into_iter().map(|x| x as f32).collect(),
        DecodingResult::I32(data) => data.into_iter().map(|x| x as f32).collect(),
        DecodingResult::I64(data) => data.into_iter().map(|x| x as f32).collect(),
        DecodingResult::F16(data) => data.into_iter().map(f32::from).collect(),
        DecodingResult::F32(data) => data,
        DecodingResult::F64(data) => data.into_iter().map(|x| x as f32).collect(),
    }
}
