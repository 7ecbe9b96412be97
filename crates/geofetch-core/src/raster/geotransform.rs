//! Affine geotransform and its GeoTIFF tag encodings.

use serde::Serialize;

/// How the pixel height passed to a writer becomes the sixth coefficient.
///
/// Rows grow southward while latitude/northing decreases, so a north-up
/// image has a negative pixel height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelHeightSign {
    /// Caller passes a positive height; it is negated (north-up output).
    #[default]
    NorthUp,
    /// Stored unmodified. Pass a negative height for north-up; a positive
    /// one yields a south-up image whose y grows with the row index.
    AsGiven,
}

/// Six coefficients `(originX, pixelWidth, rowRotation, originY, columnRotation, pixelHeight)`.
///
/// `x = c0 + col * c1 + row * c2`, `y = c3 + col * c4 + row * c5`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct GeoTransform {
    coeffs: [f64; 6],
}

impl Default for GeoTransform {
    /// Identity mapping, used for TIFFs without georeferencing tags.
    fn default() -> Self {
        Self::new([0.0, 1.0, 0.0, 0.0, 0.0, 1.0])
    }
}

impl GeoTransform {
    pub const fn new(coeffs: [f64; 6]) -> Self {
        Self { coeffs }
    }

    /// Zero-rotation transform anchored at the upper-left corner of the
    /// upper-left pixel.
    pub fn from_origin(
        origin_x: f64,
        origin_y: f64,
        pixel_width: f64,
        pixel_height: f64,
        sign: PixelHeightSign,
    ) -> Self {
        let c5 = match sign {
            PixelHeightSign::NorthUp => -pixel_height,
            PixelHeightSign::AsGiven => pixel_height,
        };
        Self::new([origin_x, pixel_width, 0.0, origin_y, 0.0, c5])
    }

    pub fn coefficients(&self) -> [f64; 6] {
        self.coeffs
    }

    pub fn origin_x(&self) -> f64 {
        self.coeffs[0]
    }

    pub fn pixel_width(&self) -> f64 {
        self.coeffs[1]
    }

    pub fn row_rotation(&self) -> f64 {
        self.coeffs[2]
    }

    pub fn origin_y(&self) -> f64 {
        self.coeffs[3]
    }

    pub fn column_rotation(&self) -> f64 {
        self.coeffs[4]
    }

    pub fn pixel_height(&self) -> f64 {
        self.coeffs[5]
    }

    pub fn has_rotation(&self) -> bool {
        self.row_rotation() != 0.0 || self.column_rotation() != 0.0
    }

    pub fn is_north_up(&self) -> bool {
        !self.has_rotation() && self.pixel_height() < 0.0
    }

    /// World coordinates of a (fractional) pixel position.
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        let c = &self.coeffs;
        (
            c[0] + col * c[1] + row * c[2],
            c[3] + col * c[4] + row * c[5],
        )
    }

    /// `ModelTiepointTag` and `ModelPixelScaleTag` values, only expressible
    /// for north-up transforms without rotation.
    pub(crate) fn to_tiepoint_and_scale(&self) -> Option<([f64; 6], [f64; 3])> {
        if !self.is_north_up() {
            return None;
        }
        let tiepoint = [0.0, 0.0, 0.0, self.origin_x(), self.origin_y(), 0.0];
        let scale = [self.pixel_width(), -self.pixel_height(), 0.0];
        Some((tiepoint, scale))
    }

    /// Row-major 4x4 `ModelTransformationTag` matrix.
    pub(crate) fn to_model_transformation(&self) -> [f64; 16] {
        let c = &self.coeffs;
        [
            c[1], c[2], 0.0, c[0], //
            c[4], c[5], 0.0, c[3], //
            0.0, 0.0, 0.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ]
    }

    pub(crate) fn from_model_transformation(m: &[f64]) -> Option<Self> {
        if m.len() < 16 {
            return None;
        }
        Some(Self::new([m[3], m[0], m[1], m[7], m[4], m[5]]))
    }

    /// Uses the first tiepoint `(I, J, K, X, Y, Z)`; the scale's Y component
    /// is positive for north-up rasters.
    pub(crate) fn from_tiepoint_and_scale(tiepoint: &[f64], scale: &[f64]) -> Option<Self> {
        if tiepoint.len() < 6 || scale.len() < 2 {
            return None;
        }
        let (i, j, x, y) = (tiepoint[0], tiepoint[1], tiepoint[3], tiepoint[4]);
        let (sx, sy) = (scale[0], scale[1]);
        Some(Self::new([x - i * sx, sx, 0.0, y + j * sy, 0.0, -sy]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn north_up_negates_pixel_height() {
        let gt = GeoTransform::from_origin(0.0, 0.0, 0.01, 0.01, PixelHeightSign::NorthUp);
        assert_eq!(gt.coefficients(), [0.0, 0.01, 0.0, 0.0, 0.0, -0.01]);
        assert!(gt.is_north_up());
    }

    #[test]
    fn as_given_keeps_pixel_height() {
        let gt = GeoTransform::from_origin(0.0, 0.0, 0.01, 0.01, PixelHeightSign::AsGiven);
        assert_eq!(gt.coefficients(), [0.0, 0.01, 0.0, 0.0, 0.0, 0.01]);
        assert!(!gt.is_north_up());

        let gt = GeoTransform::from_origin(100.0, 40.0, 0.5, -0.5, PixelHeightSign::AsGiven);
        assert_eq!(gt.coefficients(), [100.0, 0.5, 0.0, 40.0, 0.0, -0.5]);
    }

    #[test]
    fn orientation_follows_sign() {
        let rows = 10.0;
        let north_up = GeoTransform::from_origin(0.0, 50.0, 1.0, 1.0, PixelHeightSign::NorthUp);
        let (_, y_top) = north_up.apply(0.0, 0.0);
        let (_, y_bottom) = north_up.apply(0.0, rows);
        assert!(y_top > y_bottom);
        assert_eq!(y_bottom, 40.0);

        let south_up = GeoTransform::from_origin(0.0, 50.0, 1.0, 1.0, PixelHeightSign::AsGiven);
        let (_, y_bottom) = south_up.apply(0.0, rows);
        assert_eq!(y_bottom, 60.0);
    }

    #[test]
    fn apply_with_rotation() {
        let gt = GeoTransform::new([10.0, 2.0, 0.5, 20.0, 0.25, -2.0]);
        assert_eq!(gt.apply(1.0, 2.0), (10.0 + 2.0 + 1.0, 20.0 + 0.25 - 4.0));
        assert!(gt.has_rotation());
        assert!(!gt.is_north_up());
    }

    #[test]
    fn tiepoint_scale_roundtrip() {
        let gt = GeoTransform::new([500000.0, 10.0, 0.0, 4010000.0, 0.0, -10.0]);
        let (tie, scale) = gt.to_tiepoint_and_scale().unwrap();
        assert_eq!(scale, [10.0, 10.0, 0.0]);
        assert_eq!(GeoTransform::from_tiepoint_and_scale(&tie, &scale), Some(gt));
    }

    #[test]
    fn tiepoint_not_at_origin() {
        let tie = [2.0, 3.0, 0.0, 104.0, 47.0, 0.0];
        let scale = [2.0, 1.0, 0.0];
        let gt = GeoTransform::from_tiepoint_and_scale(&tie, &scale).unwrap();
        assert_eq!(gt.coefficients(), [100.0, 2.0, 0.0, 50.0, 0.0, -1.0]);
    }

    #[test]
    fn south_up_needs_model_transformation() {
        let gt = GeoTransform::from_origin(0.0, 0.0, 0.01, 0.01, PixelHeightSign::AsGiven);
        assert!(gt.to_tiepoint_and_scale().is_none());
        let m = gt.to_model_transformation();
        assert_eq!(GeoTransform::from_model_transformation(&m), Some(gt));
    }

    #[test]
    fn short_tag_values_are_rejected() {
        assert!(GeoTransform::from_model_transformation(&[1.0; 6]).is_none());
        assert!(GeoTransform::from_tiepoint_and_scale(&[0.0; 3], &[1.0, 1.0]).is_none());
    }
}
