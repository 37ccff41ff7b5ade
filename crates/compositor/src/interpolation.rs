//! Grid resampling.
//!
//! Output cells are sampled at their centers, `(x + 0.5) / dst_width`
//! across the extent, and mapped onto source cell centers. Edge cells
//! clamp to the outermost source row/column.

use rayon::prelude::*;

/// Continuous source coordinate for the center of output cell `i`.
fn source_coord(i: usize, src: usize, dst: usize) -> f64 {
    let pos = (i as f64 + 0.5) * src as f64 / dst as f64 - 0.5;
    pos.clamp(0.0, (src - 1) as f64)
}

/// Resample a row-major grid to a new size using bilinear interpolation.
///
/// A cell whose four source neighbours are not all valid is left as the
/// fill value (`nodata`, or NaN without one), so no-data never blends
/// into real values.
pub fn resample_bilinear(
    data: &[f32],
    src_width: usize,
    src_height: usize,
    dst_width: usize,
    dst_height: usize,
    nodata: Option<f32>,
) -> Vec<f32> {
    if src_width == dst_width && src_height == dst_height {
        return data.to_vec();
    }
    let fill = nodata.unwrap_or(f32::NAN);
    let mut output = vec![fill; dst_width * dst_height];
    if src_width == 0 || src_height == 0 || dst_width == 0 || dst_height == 0 {
        return output;
    }

    let invalid = |v: f32| v.is_nan() || nodata.map_or(false, |nd| v == nd);

    // One row per chunk
    output
        .par_chunks_mut(dst_width)
        .enumerate()
        .for_each(|(out_y, row)| {
            let grid_y = source_coord(out_y, src_height, dst_height);
            let y1 = grid_y.floor() as usize;
            let y2 = (y1 + 1).min(src_height - 1);
            let dy = (grid_y - y1 as f64) as f32;

            for (out_x, out) in row.iter_mut().enumerate() {
                let grid_x = source_coord(out_x, src_width, dst_width);
                let x1 = grid_x.floor() as usize;
                let x2 = (x1 + 1).min(src_width - 1);
                let dx = (grid_x - x1 as f64) as f32;

                let v11 = data.get(y1 * src_width + x1).copied().unwrap_or(f32::NAN);
                let v21 = data.get(y1 * src_width + x2).copied().unwrap_or(f32::NAN);
                let v12 = data.get(y2 * src_width + x1).copied().unwrap_or(f32::NAN);
                let v22 = data.get(y2 * src_width + x2).copied().unwrap_or(f32::NAN);

                if invalid(v11) || invalid(v21) || invalid(v12) || invalid(v22) {
                    continue;
                }

                let v1 = v11 * (1.0 - dx) + v21 * dx;
                let v2 = v12 * (1.0 - dx) + v22 * dx;
                *out = v1 * (1.0 - dy) + v2 * dy;
            }
        });

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_identity() {
        let data = vec![1.0, 2.0, 3.0, 4.0];
        assert_eq!(resample_bilinear(&data, 2, 2, 2, 2, None), data);
    }

    #[test]
    fn test_source_coord_uses_cell_centers() {
        // 2 -> 4: centers at -0.25 (clamped), 0.25, 0.75, 1.25 (clamped)
        assert_eq!(source_coord(0, 2, 4), 0.0);
        assert!((source_coord(1, 2, 4) - 0.25).abs() < 1e-12);
        assert!((source_coord(2, 2, 4) - 0.75).abs() < 1e-12);
        assert_eq!(source_coord(3, 2, 4), 1.0);
        // Downsampling 4 -> 2 samples between source pairs
        assert!((source_coord(0, 4, 2) - 0.5).abs() < 1e-12);
        assert!((source_coord(1, 4, 2) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_upscale_half_pixel() {
        let data = vec![0.0, 10.0, 20.0, 30.0];
        let out = resample_bilinear(&data, 2, 2, 4, 4, None);
        assert_eq!(out.len(), 16);
        // Outer cells clamp to the source corners
        assert!(approx(out[0], 0.0));
        assert!(approx(out[3], 10.0));
        assert!(approx(out[12], 20.0));
        assert!(approx(out[15], 30.0));
        // (1,1) samples (0.25, 0.25); (2,2) samples (0.75, 0.75)
        assert!(approx(out[5], 7.5));
        assert!(approx(out[10], 22.5));
    }

    #[test]
    fn test_nodata_not_blended() {
        let data = vec![-9999.0, 10.0, 10.0, 10.0];
        let out = resample_bilinear(&data, 2, 2, 4, 4, Some(-9999.0));
        assert!(out.iter().all(|v| *v == -9999.0 || approx(*v, 10.0)));
        // Cells whose neighbourhood touches the no-data corner stay no-data
        assert_eq!(out.iter().filter(|v| **v == -9999.0).count(), 9);
        assert_eq!(out[0], -9999.0);
        assert!(approx(out[3], 10.0));
        assert!(approx(out[15], 10.0));
    }

    #[test]
    fn test_nan_without_nodata_stays_nan() {
        let data = vec![f32::NAN, 1.0, 1.0, 1.0];
        let out = resample_bilinear(&data, 2, 2, 3, 3, None);
        assert!(out[0].is_nan());
        assert!(approx(out[8], 1.0));
    }

    #[test]
    fn test_single_row_target() {
        let data = vec![1.0, 2.0, 3.0, 4.0];
        let out = resample_bilinear(&data, 2, 2, 3, 1, None);
        // Row center falls between the two source rows
        assert!(approx(out[0], 2.0));
        assert!(approx(out[1], 2.5));
        assert!(approx(out[2], 3.0));
    }
}
