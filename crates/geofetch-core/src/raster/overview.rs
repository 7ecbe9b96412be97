//! Reduced-resolution overview levels.

use ndarray::{Array3, ArrayView2, ArrayView3, Axis};

fn is_nodata(v: f32, nodata: Option<f64>) -> bool {
    v.is_nan() || matches!(nodata, Some(nd) if !nd.is_nan() && f64::from(v) == nd)
}

/// Size of one overview dimension (`ceil(len / factor)`).
pub(crate) fn reduced_len(len: usize, factor: u32) -> usize {
    len.div_ceil(factor as usize)
}

/// Downsamples every band by `factor` with bilinear interpolation at the
/// output pixel centers. Nodata (and NaN) samples are left out of the
/// weighting; a cell with no valid neighbors becomes nodata.
pub(crate) fn downsample(data: ArrayView3<'_, f32>, factor: u32, nodata: Option<f64>) -> Array3<f32> {
    let (bands, rows, cols) = data.dim();
    let out_rows = reduced_len(rows, factor);
    let out_cols = reduced_len(cols, factor);
    let scale_y = rows as f64 / out_rows as f64;
    let scale_x = cols as f64 / out_cols as f64;
    let fill = nodata.map(|v| v as f32).unwrap_or(f32::NAN);

    Array3::from_shape_fn((bands, out_rows, out_cols), |(b, r, c)| {
        let band = data.index_axis(Axis(0), b);
        let src_y = (r as f64 + 0.5) * scale_y - 0.5;
        let src_x = (c as f64 + 0.5) * scale_x - 0.5;
        bilinear(band, src_y, src_x, nodata).unwrap_or(fill)
    })
}

fn bilinear(band: ArrayView2<'_, f32>, y: f64, x: f64, nodata: Option<f64>) -> Option<f32> {
    let (rows, cols) = band.dim();
    let y = y.clamp(0.0, (rows - 1) as f64);
    let x = x.clamp(0.0, (cols - 1) as f64);
    let y0 = y.floor() as usize;
    let x0 = x.floor() as usize;
    let y1 = (y0 + 1).min(rows - 1);
    let x1 = (x0 + 1).min(cols - 1);
    let fy = y - y0 as f64;
    let fx = x - x0 as f64;

    let taps = [
        (y0, x0, (1.0 - fy) * (1.0 - fx)),
        (y0, x1, (1.0 - fy) * fx),
        (y1, x0, fy * (1.0 - fx)),
        (y1, x1, fy * fx),
    ];

    let mut sum = 0.0;
    let mut weight = 0.0;
    for (ty, tx, w) in taps {
        let v = band[[ty, tx]];
        if w == 0.0 || is_nodata(v, nodata) {
            continue;
        }
        sum += f64::from(v) * w;
        weight += w;
    }
    (weight > 0.0).then(|| (sum / weight) as f32)
}
