//! Real-input 2D FFT wrappers around rustfft.
//!
//! Convention matches numpy:
//! - Forward rfft2: unnormalized, one-sided along the last axis (nx/2+1)
//! - Inverse irfft2: normalized by 1/(ny*nx)
//!
//! The grid length along the last axis must be even; the one-sided
//! spectrum then determines it as nx = 2*(nxh - 1).

use ndarray::Array2;
use num_complex::Complex64;
use rustfft::FftPlanner;

/// Forward real 2D FFT over a (ny, nx) slab. Matches `numpy.fft.rfft2()`.
pub fn rfft2(input: &Array2<f64>) -> Array2<Complex64> {
    let (ny, nx) = input.dim();
    let nxh = nx / 2 + 1;
    let mut planner = FftPlanner::new();

    // Complex FFT along each row (x axis), keep the non-redundant half
    let fft_x = planner.plan_fft_forward(nx);
    let mut half = Array2::zeros((ny, nxh));
    let mut row_buf = vec![Complex64::new(0.0, 0.0); nx];
    for (i, row) in input.rows().into_iter().enumerate() {
        for (j, &v) in row.iter().enumerate() {
            row_buf[j] = Complex64::new(v, 0.0);
        }
        fft_x.process(&mut row_buf);
        for j in 0..nxh {
            half[[i, j]] = row_buf[j];
        }
    }

    // Complex FFT along each retained column (y axis)
    let fft_y = planner.plan_fft_forward(ny);
    let mut col_buf = vec![Complex64::new(0.0, 0.0); ny];
    for j in 0..nxh {
        for i in 0..ny {
            col_buf[i] = half[[i, j]];
        }
        fft_y.process(&mut col_buf);
        for i in 0..ny {
            half[[i, j]] = col_buf[i];
        }
    }

    half
}

/// Inverse real 2D FFT of a one-sided (ny, nx/2+1) spectrum. Matches
/// `numpy.fft.irfft2()` for even nx.
pub fn irfft2(input: &Array2<Complex64>) -> Array2<f64> {
    let (ny, nxh) = input.dim();
    let nx = 2 * (nxh - 1);
    let mut planner = FftPlanner::new();

    // Inverse FFT along each column (y axis)
    let ifft_y = planner.plan_fft_inverse(ny);
    let mut data = input.clone();
    let mut col_buf = vec![Complex64::new(0.0, 0.0); ny];
    for j in 0..nxh {
        for i in 0..ny {
            col_buf[i] = data[[i, j]];
        }
        ifft_y.process(&mut col_buf);
        for i in 0..ny {
            data[[i, j]] = col_buf[i];
        }
    }

    // Expand each row by Hermitian symmetry, inverse FFT along x
    let ifft_x = planner.plan_fft_inverse(nx);
    let norm = 1.0 / (ny * nx) as f64;
    let mut out = Array2::zeros((ny, nx));
    let mut row_buf = vec![Complex64::new(0.0, 0.0); nx];
    for i in 0..ny {
        for j in 0..nxh {
            row_buf[j] = data[[i, j]];
        }
        for j in nxh..nx {
            row_buf[j] = data[[i, nx - j]].conj();
        }
        ifft_x.process(&mut row_buf);
        for j in 0..nx {
            out[[i, j]] = row_buf[j].re * norm;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_rfft2_roundtrip() {
        let mut rng = StdRng::seed_from_u64(42);
        let original = Array2::from_shape_fn((32, 32), |_| rng.gen_range(-1.0..1.0));
        let spectrum = rfft2(&original);
        assert_eq!(spectrum.dim(), (32, 17));
        let recovered = irfft2(&spectrum);

        for ((i, j), &val) in original.indexed_iter() {
            assert!(
                (recovered[[i, j]] - val).abs() < 1e-12,
                "roundtrip failed at ({i}, {j}): {} vs {val}",
                recovered[[i, j]]
            );
        }
    }

    #[test]
    fn test_rfft2_dc_component() {
        // For a constant field, the DC coefficient is ny*nx*value
        let n = 16;
        let val = 3.0;
        let input = Array2::from_elem((n, n), val);
        let spectrum = rfft2(&input);

        let expected_dc = (n * n) as f64 * val;
        assert!(
            (spectrum[[0, 0]].re - expected_dc).abs() < 1e-9,
            "DC component: {} vs {expected_dc}",
            spectrum[[0, 0]].re
        );
        for ((i, j), &v) in spectrum.indexed_iter() {
            if (i, j) != (0, 0) {
                assert!(v.norm() < 1e-9, "non-DC mode ({i}, {j}) should vanish");
            }
        }
    }

    #[test]
    fn test_rfft2_single_mode() {
        // cos(2*pi*x/n) puts n^2/2 into the (0, 1) coefficient
        let n = 16;
        let input = Array2::from_shape_fn((n, n), |(_, j)| {
            (2.0 * std::f64::consts::PI * j as f64 / n as f64).cos()
        });
        let spectrum = rfft2(&input);
        let expected = (n * n) as f64 / 2.0;
        assert!(
            (spectrum[[0, 1]].re - expected).abs() < 1e-9,
            "cos mode amplitude: {} vs {expected}",
            spectrum[[0, 1]].re
        );
        assert!(spectrum[[0, 1]].im.abs() < 1e-9);
    }

    #[test]
    fn test_rfft2_rectangular_slab() {
        let mut rng = StdRng::seed_from_u64(7);
        let original = Array2::from_shape_fn((24, 16), |_| rng.gen_range(-5.0..5.0));
        let recovered = irfft2(&rfft2(&original));
        for ((i, j), &val) in original.indexed_iter() {
            assert!(
                (recovered[[i, j]] - val).abs() < 1e-12,
                "rectangular roundtrip failed at ({i}, {j})"
            );
        }
    }
}
