//! EPSG coordinate reference systems backed by the crs-definitions database.

use serde::Serialize;

use super::RasterError;

/// A coordinate reference system: the EPSG code plus its WKT and PROJ
/// expansion when the code is in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Crs {
    pub epsg: u16,
    pub wkt: Option<&'static str>,
    pub proj4: Option<&'static str>,
}

impl Crs {
    /// Resolves a code, failing when it is out of range or unknown.
    pub fn from_epsg(code: u32) -> Result<Self, RasterError> {
        u16::try_from(code)
            .ok()
            .and_then(Self::lookup)
            .ok_or(RasterError::UnknownCrs(code))
    }

    /// CRS read from a file: keeps the code even when the database lacks it.
    pub fn from_epsg_lenient(code: u16) -> Self {
        Self::lookup(code).unwrap_or(Crs {
            epsg: code,
            wkt: None,
            proj4: None,
        })
    }

    fn lookup(code: u16) -> Option<Self> {
        crs_definitions::from_code(code).map(|def| Crs {
            epsg: code,
            wkt: Some(def.wkt),
            proj4: Some(def.proj4),
        })
    }

    /// Longitude/latitude CRS (GeoTIFF "geographic" model) vs projected.
    pub fn is_geographic(&self) -> bool {
        match self.proj4 {
            Some(proj) => proj.contains("+proj=longlat"),
            // Geographic 2D codes live in the 4000-4999 range.
            None => (4000..5000).contains(&self.epsg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wgs84_resolves_to_geographic_wkt() {
        let crs = Crs::from_epsg(4326).unwrap();
        assert_eq!(crs.epsg, 4326);
        assert!(crs.is_geographic());
        assert!(crs.wkt.unwrap().contains("WGS"));
    }

    #[test]
    fn utm_is_projected() {
        let crs = Crs::from_epsg(32610).unwrap();
        assert!(!crs.is_geographic());
        assert!(crs.proj4.unwrap().contains("+proj=utm"));
    }

    #[test]
    fn unknown_codes_fail() {
        assert!(matches!(Crs::from_epsg(1), Err(RasterError::UnknownCrs(1))));
        assert!(matches!(
            Crs::from_epsg(900_913_000),
            Err(RasterError::UnknownCrs(900_913_000))
        ));
    }

    #[test]
    fn lenient_keeps_unknown_code() {
        let crs = Crs::from_epsg_lenient(1);
        assert_eq!(crs.epsg, 1);
        assert!(crs.wkt.is_none());
    }
}
