//! GeoKeyDirectory encoding and decoding (GeoTIFF 1.0 keys only).
//!
//! Directory layout: `[KeyDirectoryVersion, KeyRevision, MinorRevision,
//! NumberOfKeys, (KeyID, TIFFTagLocation, Count, Value_Offset)*]`, keys sorted
//! by ID.

use super::Crs;

pub(crate) const GEO_ASCII_PARAMS_TAG: u16 = 34737;

const GT_MODEL_TYPE_GEO_KEY: u16 = 1024;
const GT_RASTER_TYPE_GEO_KEY: u16 = 1025;
const GT_CITATION_GEO_KEY: u16 = 1026;
const GEOGRAPHIC_TYPE_GEO_KEY: u16 = 2048;
const PROJECTED_CS_TYPE_GEO_KEY: u16 = 3072;

const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;
const USER_DEFINED: u16 = 32767;

/// Key directory plus the GeoAsciiParams string its citation points into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EncodedGeoKeys {
    pub directory: Vec<u16>,
    pub ascii_params: Option<String>,
}

pub(crate) fn encode(crs: Option<&Crs>) -> EncodedGeoKeys {
    let mut keys: Vec<[u16; 4]> = Vec::with_capacity(4);
    let mut ascii_params = None;

    if let Some(crs) = crs {
        let model = if crs.is_geographic() {
            MODEL_TYPE_GEOGRAPHIC
        } else {
            MODEL_TYPE_PROJECTED
        };
        keys.push([GT_MODEL_TYPE_GEO_KEY, 0, 1, model]);
    }
    keys.push([GT_RASTER_TYPE_GEO_KEY, 0, 1, RASTER_PIXEL_IS_AREA]);

    if let Some(crs) = crs {
        // GeoAsciiParams entries are '|'-terminated.
        let citation = format!("EPSG:{}|", crs.epsg);
        keys.push([
            GT_CITATION_GEO_KEY,
            GEO_ASCII_PARAMS_TAG,
            citation.len() as u16,
            0,
        ]);
        ascii_params = Some(citation);

        let crs_key = if crs.is_geographic() {
            GEOGRAPHIC_TYPE_GEO_KEY
        } else {
            PROJECTED_CS_TYPE_GEO_KEY
        };
        keys.push([crs_key, 0, 1, crs.epsg]);
    }

    let mut directory = vec![1, 1, 0, keys.len() as u16];
    directory.extend(keys.iter().flatten());
    EncodedGeoKeys {
        directory,
        ascii_params,
    }
}

/// EPSG code from `ProjectedCSTypeGeoKey`, else `GeographicTypeGeoKey`.
/// User-defined and undefined values yield None.
pub(crate) fn decode_epsg(directory: &[u16]) -> Option<u16> {
    if directory.len() < 4 {
        return None;
    }
    let count = directory[3] as usize;
    let entries = directory[4..].chunks_exact(4).take(count);

    let mut projected = None;
    let mut geographic = None;
    for entry in entries {
        let (key, location, value) = (entry[0], entry[1], entry[3]);
        if location != 0 || value == 0 || value == USER_DEFINED {
            continue;
        }
        match key {
            PROJECTED_CS_TYPE_GEO_KEY => projected = Some(value),
            GEOGRAPHIC_TYPE_GEO_KEY => geographic = Some(value),
            _ => {}
        }
    }
    projected.or(geographic)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geographic_directory() {
        let crs = Crs::from_epsg(4326).unwrap();
        let enc = encode(Some(&crs));
        let d = &enc.directory;

        assert_eq!(&d[..4], &[1, 1, 0, 4]);
        assert_eq!(&d[4..8], &[GT_MODEL_TYPE_GEO_KEY, 0, 1, MODEL_TYPE_GEOGRAPHIC]);
        assert_eq!(&d[8..12], &[GT_RASTER_TYPE_GEO_KEY, 0, 1, RASTER_PIXEL_IS_AREA]);
        assert_eq!(d[12], GT_CITATION_GEO_KEY);
        assert_eq!(d[13], GEO_ASCII_PARAMS_TAG);
        assert_eq!(&d[16..20], &[GEOGRAPHIC_TYPE_GEO_KEY, 0, 1, 4326]);
        assert_eq!(enc.ascii_params.as_deref(), Some("EPSG:4326|"));
        assert_eq!(d[14] as usize, "EPSG:4326|".len());
    }

    #[test]
    fn projected_directory() {
        let crs = Crs::from_epsg(32610).unwrap();
        let enc = encode(Some(&crs));
        assert_eq!(enc.directory[7], MODEL_TYPE_PROJECTED);
        assert_eq!(&enc.directory[16..20], &[PROJECTED_CS_TYPE_GEO_KEY, 0, 1, 32610]);
    }

    #[test]
    fn keys_are_sorted() {
        let crs = Crs::from_epsg(3857).unwrap();
        let enc = encode(Some(&crs));
        let ids: Vec<u16> = enc.directory[4..].chunks(4).map(|e| e[0]).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn no_crs_writes_raster_type_only() {
        let enc = encode(None);
        assert_eq!(enc.directory, vec![1, 1, 0, 1, GT_RASTER_TYPE_GEO_KEY, 0, 1, 1]);
        assert!(enc.ascii_params.is_none());
        assert_eq!(decode_epsg(&enc.directory), None);
    }

    #[test]
    fn decode_roundtrip() {
        for code in [4326u32, 32633, 3857] {
            let crs = Crs::from_epsg(code).unwrap();
            assert_eq!(decode_epsg(&encode(Some(&crs)).directory), Some(code as u16));
        }
    }

    #[test]
    fn decode_prefers_projected_and_skips_user_defined() {
        let dir = [
            1, 1, 0, 3, //
            GT_MODEL_TYPE_GEO_KEY, 0, 1, MODEL_TYPE_PROJECTED, //
            GEOGRAPHIC_TYPE_GEO_KEY, 0, 1, 4269, //
            PROJECTED_CS_TYPE_GEO_KEY, 0, 1, 26918,
        ];
        assert_eq!(decode_epsg(&dir), Some(26918));

        let user_defined = [1, 1, 0, 1, PROJECTED_CS_TYPE_GEO_KEY, 0, 1, USER_DEFINED];
        assert_eq!(decode_epsg(&user_defined), None);
    }

    #[test]
    fn decode_truncated_directory() {
        assert_eq!(decode_epsg(&[1, 1]), None);
        assert_eq!(decode_epsg(&[1, 1, 0, 2, GEOGRAPHIC_TYPE_GEO_KEY, 0]), None);
    }
}
