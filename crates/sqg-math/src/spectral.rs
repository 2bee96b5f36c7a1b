// ─────────────────────────────────────────────────────────────────────
// SQG Turb Core — Spectral Engine
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Wavenumber bookkeeping, backend-dispatched transforms over level
//! stacks, spectral horizontal derivatives, and the closed-form
//! two-level PV -> streamfunction inversion.

use ndarray::{Array1, Array2, Array3};
use num_complex::Complex64;
use rayon::prelude::*;
use std::f64::consts::PI;

use sqg_types::error::{SqgError, SqgResult};

use crate::fft::{irfft2, rfft2};

/// Wavenumber arrays for an nx-by-nx doubly-periodic grid, derived once
/// from the grid parameters and read-only thereafter.
///
/// kx is one-sided (0..=nx/2); ky carries the full signed range in FFT
/// order. Dimensional arrays are scaled by 2*pi/L.
#[derive(Debug, Clone)]
pub struct Wavenumbers {
    pub nx: usize,
    /// One-sided spectral width, nx/2 + 1.
    pub nxh: usize,
    /// Domain length (m).
    pub l_domain: f64,
    /// Nondimensional one-sided kx, [nxh].
    pub kx_int: Array1<f64>,
    /// Nondimensional signed ky in FFT order, [nx].
    pub ky_int: Array1<f64>,
    /// Dimensional kx meshgrid (rad/m), [nx, nxh].
    pub kx: Array2<f64>,
    /// Dimensional ky meshgrid (rad/m), [nx, nxh].
    pub ky: Array2<f64>,
    /// kx^2 + ky^2, [nx, nxh].
    pub ksq: Array2<f64>,
    /// |k|, [nx, nxh].
    pub ktot: Array2<f64>,
    /// Largest resolved total wavenumber, pi*nx/L (rad/m).
    pub kcutoff: f64,
}

impl Wavenumbers {
    pub fn new(nx: usize, l_domain: f64) -> Self {
        let nxh = nx / 2 + 1;
        let kx_int = Array1::from_shape_fn(nxh, |j| j as f64);
        let ky_int = Array1::from_shape_fn(nx, |i| {
            if i < nx / 2 {
                i as f64
            } else {
                i as f64 - nx as f64
            }
        });
        let dk = 2.0 * PI / l_domain;
        let kx = Array2::from_shape_fn((nx, nxh), |(_, j)| kx_int[j] * dk);
        let ky = Array2::from_shape_fn((nx, nxh), |(i, _)| ky_int[i] * dk);
        let ksq = Array2::from_shape_fn((nx, nxh), |(i, j)| {
            kx[[i, j]] * kx[[i, j]] + ky[[i, j]] * ky[[i, j]]
        });
        let ktot = ksq.mapv(f64::sqrt);
        let kcutoff = PI * nx as f64 / l_domain;

        Wavenumbers {
            nx,
            nxh,
            l_domain,
            kx_int,
            ky_int,
            kx,
            ky,
            ksq,
            ktot,
            kcutoff,
        }
    }

    /// 2/3-rule dealias mask: 1 inside the retained shell, 0 outside.
    pub fn dealias_mask(&self) -> Array2<f64> {
        let kcut = (2.0 / 3.0) * self.kcutoff;
        Array2::from_shape_fn((self.nx, self.nxh), |(i, j)| {
            if self.ktot[[i, j]] < kcut {
                1.0
            } else {
                0.0
            }
        })
    }
}

/// Forward/inverse transform capability over (nz, ny, nx) level stacks.
///
/// The integrator and the diagnostics depend only on this interface;
/// the caller selects an implementation from configuration.
pub trait SpectralBackend: Send + Sync {
    /// Real-input transform of every level, one-sided along x.
    fn rfft2(&self, field: &Array3<f64>) -> Array3<Complex64>;

    /// Inverse of `rfft2`; reconstructs the (nz, ny, nx) grid stack.
    fn irfft2(&self, spec: &Array3<Complex64>) -> Array3<f64>;
}

/// In-process backend: transforms one level at a time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialBackend;

impl SpectralBackend for SerialBackend {
    fn rfft2(&self, field: &Array3<f64>) -> Array3<Complex64> {
        let (nz, ny, nx) = field.dim();
        let mut out = Array3::zeros((nz, ny, nx / 2 + 1));
        for (mut spec, level) in out.outer_iter_mut().zip(field.outer_iter()) {
            spec.assign(&rfft2(&level.to_owned()));
        }
        out
    }

    fn irfft2(&self, spec: &Array3<Complex64>) -> Array3<f64> {
        let (nz, ny, nxh) = spec.dim();
        let mut out = Array3::zeros((nz, ny, 2 * (nxh - 1)));
        for (mut grid, level) in out.outer_iter_mut().zip(spec.outer_iter()) {
            grid.assign(&irfft2(&level.to_owned()));
        }
        out
    }
}

/// Thread-pool backend: fans the level transforms across rayon workers.
pub struct ThreadedBackend {
    pool: rayon::ThreadPool,
}

impl ThreadedBackend {
    pub fn new(threads: usize) -> SqgResult<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| SqgError::ConfigError(format!("Failed to build thread pool: {e}")))?;
        Ok(ThreadedBackend { pool })
    }
}

impl SpectralBackend for ThreadedBackend {
    fn rfft2(&self, field: &Array3<f64>) -> Array3<Complex64> {
        let levels: Vec<Array2<f64>> = field.outer_iter().map(|v| v.to_owned()).collect();
        let specs: Vec<Array2<Complex64>> =
            self.pool.install(|| levels.par_iter().map(rfft2).collect());
        stack_levels(&specs)
    }

    fn irfft2(&self, spec: &Array3<Complex64>) -> Array3<f64> {
        let levels: Vec<Array2<Complex64>> = spec.outer_iter().map(|v| v.to_owned()).collect();
        let grids: Vec<Array2<f64>> =
            self.pool.install(|| levels.par_iter().map(irfft2).collect());
        stack_levels(&grids)
    }
}

fn stack_levels<T: Clone>(levels: &[Array2<T>]) -> Array3<T> {
    let views: Vec<_> = levels.iter().map(|a| a.view()).collect();
    ndarray::stack(ndarray::Axis(0), &views).expect("levels share a shape")
}

/// Horizontal axis selector for spectral derivatives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizontalAxis {
    X,
    Y,
}

/// A horizontal field in whichever representation the caller holds.
pub enum FieldRepr<'a> {
    Grid(&'a Array3<f64>),
    Spectral(&'a Array3<Complex64>),
}

/// Spectral horizontal derivative: multiply by i*k along the chosen
/// axis. Always returns grid-space output.
pub fn derivative(
    backend: &dyn SpectralBackend,
    wav: &Wavenumbers,
    field: FieldRepr<'_>,
    axis: HorizontalAxis,
) -> Array3<f64> {
    let spec = match field {
        FieldRepr::Grid(arr) => backend.rfft2(arr),
        FieldRepr::Spectral(arr) => arr.clone(),
    };
    let k = match axis {
        HorizontalAxis::X => &wav.kx,
        HorizontalAxis::Y => &wav.ky,
    };
    let (nz, ny, nxh) = spec.dim();
    let mut dspec = Array3::zeros((nz, ny, nxh));
    for z in 0..nz {
        for i in 0..ny {
            for j in 0..nxh {
                dspec[[z, i, j]] = spec[[z, i, j]] * Complex64::new(0.0, k[[i, j]]);
            }
        }
    }
    backend.irfft2(&dspec)
}

/// Closed-form two-level PV -> streamfunction inversion.
///
/// The vertical problem has hyperbolic-function eigenfunctions in
/// Fourier space, so no iterative solver is involved: with
/// mu = |k| sqrt(nsq) H / f (clipped below at machine epsilon),
///   psi_0 = (H/mu) (q_1 / sinh mu - q_0 / tanh mu)
///   psi_1 = (H/mu) (q_1 / tanh mu - q_0 / sinh mu)
#[derive(Debug, Clone)]
pub struct TwoLevelInversion {
    hovermu: Array2<f64>,
    sinhmu: Array2<f64>,
    tanhmu: Array2<f64>,
}

impl TwoLevelInversion {
    pub fn new(wav: &Wavenumbers, nsq: f64, h: f64, f: f64) -> Self {
        let mu = wav
            .ktot
            .mapv(|k| (k * nsq.sqrt() * h / f).max(f64::EPSILON));
        TwoLevelInversion {
            hovermu: mu.mapv(|m| h / m),
            sinhmu: mu.mapv(f64::sinh),
            tanhmu: mu.mapv(f64::tanh),
        }
    }

    /// Streamfunction spectra from two-level PV spectra.
    pub fn invert(&self, pvspec: &Array3<Complex64>) -> Array3<Complex64> {
        let (nz, ny, nxh) = pvspec.dim();
        debug_assert_eq!(nz, 2, "two-level inversion requires nz = 2");
        let mut psispec = Array3::zeros((2, ny, nxh));
        for i in 0..ny {
            for j in 0..nxh {
                let q0 = pvspec[[0, i, j]];
                let q1 = pvspec[[1, i, j]];
                let hm = self.hovermu[[i, j]];
                let sh = self.sinhmu[[i, j]];
                let th = self.tanhmu[[i, j]];
                psispec[[0, i, j]] = (q1 / sh - q0 / th) * hm;
                psispec[[1, i, j]] = (q1 / th - q0 / sh) * hm;
            }
        }
        psispec
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const L_DOMAIN: f64 = 2.0e7;
    const NSQ: f64 = 1.0e-4;
    const H_LID: f64 = 1.0e4;
    const F_COR: f64 = 1.0e-4;

    #[test]
    fn test_wavenumber_layout() {
        let wav = Wavenumbers::new(8, L_DOMAIN);
        assert_eq!(wav.nxh, 5);
        assert_eq!(wav.kx_int.as_slice().unwrap(), &[0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(
            wav.ky_int.as_slice().unwrap(),
            &[0.0, 1.0, 2.0, 3.0, -4.0, -3.0, -2.0, -1.0]
        );
        let dk = 2.0 * PI / L_DOMAIN;
        assert!((wav.kx[[0, 1]] - dk).abs() < 1e-18);
        assert!((wav.ky[[7, 0]] + dk).abs() < 1e-18);
        assert!((wav.kcutoff - PI * 8.0 / L_DOMAIN).abs() < 1e-18);
    }

    #[test]
    fn test_dealias_mask_keeps_low_drops_high() {
        let wav = Wavenumbers::new(64, L_DOMAIN);
        let mask = wav.dealias_mask();
        assert_eq!(mask[[0, 0]], 1.0);
        assert_eq!(mask[[0, 1]], 1.0);
        // the largest resolved kx sits outside the 2/3 shell
        assert_eq!(mask[[0, wav.nxh - 1]], 0.0);
        // idempotent by construction
        for &v in mask.iter() {
            assert!(v == 0.0 || v == 1.0);
        }
    }

    #[test]
    fn test_backends_agree() {
        let field = Array3::from_shape_fn((2, 16, 16), |(z, i, j)| {
            ((z + 1) as f64) * ((i * 16 + j) as f64).sin()
        });
        let serial = SerialBackend;
        let threaded = ThreadedBackend::new(2).unwrap();

        let s1 = serial.rfft2(&field);
        let s2 = threaded.rfft2(&field);
        for (a, b) in s1.iter().zip(s2.iter()) {
            assert!((a - b).norm() < 1e-12, "backend spectra must agree");
        }

        let g1 = serial.irfft2(&s1);
        let g2 = threaded.irfft2(&s2);
        for ((a, b), &orig) in g1.iter().zip(g2.iter()).zip(field.iter()) {
            assert!((a - b).abs() < 1e-12);
            assert!((a - orig).abs() < 1e-12, "roundtrip through stack failed");
        }
    }

    #[test]
    fn test_derivative_of_single_mode() {
        // f(x) = sin(2 pi x / L) has df/dx = (2 pi / L) cos(2 pi x / L)
        let n = 32;
        let wav = Wavenumbers::new(n, L_DOMAIN);
        let field = Array3::from_shape_fn((2, n, n), |(_, _, j)| {
            (2.0 * PI * j as f64 / n as f64).sin()
        });
        let backend = SerialBackend;
        let ddx = derivative(&backend, &wav, FieldRepr::Grid(&field), HorizontalAxis::X);
        let k1 = 2.0 * PI / L_DOMAIN;
        for z in 0..2 {
            for i in 0..n {
                for j in 0..n {
                    let expected = k1 * (2.0 * PI * j as f64 / n as f64).cos();
                    assert!(
                        (ddx[[z, i, j]] - expected).abs() < 1e-12,
                        "d/dx mismatch at ({z}, {i}, {j})"
                    );
                }
            }
        }

        // a zonally uniform field has no x derivative
        let uniform = Array3::from_shape_fn((2, n, n), |(_, i, _)| i as f64);
        let ddx0 = derivative(&backend, &wav, FieldRepr::Grid(&uniform), HorizontalAxis::X);
        for &v in ddx0.iter() {
            assert!(v.abs() < 1e-10);
        }
    }

    #[test]
    fn test_derivative_accepts_spectral_input() {
        let n = 16;
        let wav = Wavenumbers::new(n, L_DOMAIN);
        let field = Array3::from_shape_fn((2, n, n), |(_, i, j)| {
            (2.0 * PI * i as f64 / n as f64).sin() + (2.0 * PI * j as f64 / n as f64).cos()
        });
        let backend = SerialBackend;
        let spec = backend.rfft2(&field);
        let from_grid = derivative(&backend, &wav, FieldRepr::Grid(&field), HorizontalAxis::Y);
        let from_spec =
            derivative(&backend, &wav, FieldRepr::Spectral(&spec), HorizontalAxis::Y);
        for (a, b) in from_grid.iter().zip(from_spec.iter()) {
            assert!((a - b).abs() < 1e-12, "both entry points must agree");
        }
    }

    #[test]
    fn test_inversion_single_mode_closed_form() {
        // One Fourier mode with PV only at the surface: the closed form
        // gives psi_0 = -(H/mu) q0 / tanh(mu), psi_1 = -(H/mu) q0 / sinh(mu).
        let n = 16;
        let wav = Wavenumbers::new(n, L_DOMAIN);
        let inv = TwoLevelInversion::new(&wav, NSQ, H_LID, F_COR);

        let (iy, jx) = (3, 2);
        let amp = Complex64::new(1.5, -0.25);
        let mut pvspec = Array3::zeros((2, n, wav.nxh));
        pvspec[[0, iy, jx]] = amp;

        let psispec = inv.invert(&pvspec);

        let mu = wav.ktot[[iy, jx]] * NSQ.sqrt() * H_LID / F_COR;
        let hovermu = H_LID / mu;
        let expected0 = -amp * (hovermu / mu.tanh());
        let expected1 = -amp * (hovermu / mu.sinh());
        assert!(
            (psispec[[0, iy, jx]] - expected0).norm() < 1e-10 * expected0.norm(),
            "surface streamfunction: {} vs {expected0}",
            psispec[[0, iy, jx]]
        );
        assert!(
            (psispec[[1, iy, jx]] - expected1).norm() < 1e-10 * expected1.norm(),
            "lid streamfunction: {} vs {expected1}",
            psispec[[1, iy, jx]]
        );
        // all other modes stay zero
        let mut nonzero = 0;
        for z in 0..2 {
            for i in 0..n {
                for j in 0..wav.nxh {
                    if psispec[[z, i, j]].norm() > 0.0 {
                        nonzero += 1;
                        assert_eq!((i, j), (iy, jx));
                    }
                }
            }
        }
        assert_eq!(nonzero, 2);
    }

    #[test]
    fn test_inversion_is_linear() {
        let n = 16;
        let wav = Wavenumbers::new(n, L_DOMAIN);
        let inv = TwoLevelInversion::new(&wav, NSQ, H_LID, F_COR);
        let a = Array3::from_shape_fn((2, n, wav.nxh), |(z, i, j)| {
            Complex64::new((z + i) as f64, j as f64)
        });
        let b = Array3::from_shape_fn((2, n, wav.nxh), |(z, i, j)| {
            Complex64::new(j as f64 - 1.0, (z * i) as f64)
        });
        let sum = &a + &b;
        let lhs = inv.invert(&sum);
        let rhs = &inv.invert(&a) + &inv.invert(&b);
        for (x, y) in lhs.iter().zip(rhs.iter()) {
            assert!((x - y).norm() < 1e-9, "inversion must be linear");
        }
    }
}
