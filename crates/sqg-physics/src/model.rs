// ─────────────────────────────────────────────────────────────────────
// SQG Turb Core — Model
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Two-level surface quasi-geostrophic dynamics in spectral space.
//!
//! PV on the surface and lid levels is advected by the streamfunction
//! recovered through the closed-form elliptic inversion, relaxed toward
//! a climatological jet, optionally damped by a surface Ekman layer,
//! and filtered each step by a hyperdiffusion integrating factor. Time
//! integration is RK4 at a fixed step.

use ndarray::{Array1, Array2, Array3};
use num_complex::Complex64;
use std::f64::consts::PI;
use std::sync::Arc;

use sqg_math::spectral::{
    derivative, FieldRepr, HorizontalAxis, SpectralBackend, TwoLevelInversion, Wavenumbers,
};
use sqg_types::config::TurbParams;
use sqg_types::error::{SqgError, SqgResult};

/// Ekman damping is inactive below this coefficient.
const EKMAN_THRESHOLD: f64 = 1.0e-10;

/// Climatological jet PV on the (z, y, x) grid, the thermal relaxation
/// target.
///
/// With l = 2 pi / L and mubar = l sqrt(nsq) H / f, the symmetric jet is
///   qbar = -(mubar U / (2 l H)) cosh(mubar/2) / sinh(mubar/2) cos(l y)
/// at both levels; the asymmetric jet (no wind at the surface) is
///   qbar = -(mubar U / (l H)) cos(l y) / sinh(mubar)
/// with the lid level scaled by cosh(mubar).
pub fn equilibrium_pv(params: &TurbParams) -> Array3<f64> {
    let n = params.nx;
    let l = 2.0 * PI / params.l;
    let mubar = l * params.nsq.sqrt() * params.h / params.f;

    let profile = Array1::from_shape_fn(n, |i| {
        let y = i as f64 * params.l / n as f64;
        if params.symmetric {
            -(mubar * 0.5 * params.u / (l * params.h)) * (0.5 * mubar).cosh()
                / (0.5 * mubar).sinh()
                * (l * y).cos()
        } else {
            -(mubar * params.u / (l * params.h)) * (l * y).cos() / mubar.sinh()
        }
    });

    Array3::from_shape_fn((2, n, n), |(lev, i, _)| {
        if !params.symmetric && lev == 1 {
            profile[i] * mubar.cosh()
        } else {
            profile[i]
        }
    })
}

/// The spectral SQG integrator.
pub struct SqgModel {
    params: TurbParams,
    wav: Wavenumbers,
    inversion: TwoLevelInversion,
    backend: Arc<dyn SpectralBackend>,
    /// Hyperdiffusion integrating factor per mode:
    /// exp(-dt/diff_efold * (|k|/kcutoff)^diff_order).
    hyperdiff: Array2<f64>,
    /// 2/3-rule mask for the Jacobian spectrum, when dealiasing is on.
    dealias_mask: Option<Array2<f64>>,
    /// Spectrum of the climatological jet PV.
    pvspec_eq: Array3<Complex64>,
    ekman: bool,
    /// Current PV spectrum, (2, nx, nx/2+1).
    pvspec: Array3<Complex64>,
    /// Model time (s).
    pub t: f64,
}

impl std::fmt::Debug for SqgModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqgModel")
            .field("params", &self.params)
            .field("ekman", &self.ekman)
            .field("t", &self.t)
            .finish_non_exhaustive()
    }
}

impl SqgModel {
    /// Build the model from a gridded (2, nx, nx) initial PV field.
    pub fn new(
        pv0: &Array3<f64>,
        params: &TurbParams,
        backend: Arc<dyn SpectralBackend>,
    ) -> SqgResult<Self> {
        let (nz, ny, nx) = pv0.dim();
        if nz != 2 || ny != params.nx || nx != params.nx {
            return Err(SqgError::ShapeMismatch(format!(
                "initial PV must be (2, {0}, {0}), got ({nz}, {ny}, {nx})",
                params.nx
            )));
        }

        let wav = Wavenumbers::new(params.nx, params.l);
        let inversion = TwoLevelInversion::new(&wav, params.nsq, params.h, params.f);
        let hyperdiff = wav.ktot.mapv(|k| {
            (-params.delta_t / params.diff_efold * (k / wav.kcutoff).powi(params.diff_order))
                .exp()
        });
        let dealias_mask = params.dealias.then(|| wav.dealias_mask());
        let pvspec_eq = backend.rfft2(&equilibrium_pv(params));
        let pvspec = backend.rfft2(pv0);

        Ok(SqgModel {
            ekman: params.r.abs() >= EKMAN_THRESHOLD,
            params: params.clone(),
            wav,
            inversion,
            backend,
            hyperdiff,
            dealias_mask,
            pvspec_eq,
            pvspec,
            t: params.tstart,
        })
    }

    pub fn params(&self) -> &TurbParams {
        &self.params
    }

    pub fn wavenumbers(&self) -> &Wavenumbers {
        &self.wav
    }

    /// Current PV spectrum.
    pub fn pvspec(&self) -> &Array3<Complex64> {
        &self.pvspec
    }

    /// Replace the spectral state, e.g. when resuming from a snapshot.
    pub fn set_pvspec(&mut self, pvspec: Array3<Complex64>) -> SqgResult<()> {
        if pvspec.dim() != self.pvspec.dim() {
            return Err(SqgError::ShapeMismatch(format!(
                "expected spectral state {:?}, got {:?}",
                self.pvspec.dim(),
                pvspec.dim()
            )));
        }
        self.pvspec = pvspec;
        Ok(())
    }

    /// Current PV on the grid.
    pub fn pv(&self) -> Array3<f64> {
        self.backend.irfft2(&self.pvspec)
    }

    /// Geostrophic winds (u, v) = (-dpsi/dy, dpsi/dx) on the grid.
    pub fn winds(&self) -> (Array3<f64>, Array3<f64>) {
        let psispec = self.inversion.invert(&self.pvspec);
        let u = derivative(
            self.backend.as_ref(),
            &self.wav,
            FieldRepr::Spectral(&psispec),
            HorizontalAxis::Y,
        )
        .mapv(|v| -v);
        let v = derivative(
            self.backend.as_ref(),
            &self.wav,
            FieldRepr::Spectral(&psispec),
            HorizontalAxis::X,
        );
        (u, v)
    }

    /// PV tendency in spectral space: thermal relaxation minus the
    /// dealiased pseudo-spectral Jacobian, plus Ekman damping at the
    /// boundaries when active.
    fn tendency(&self, pvspec: &Array3<Complex64>) -> Array3<Complex64> {
        let n = self.params.nx;
        let nxh = self.wav.nxh;
        let psispec = self.inversion.invert(pvspec);

        let iu = Complex64::new(0.0, 1.0);
        let mul_k = |spec: &Array3<Complex64>, k: &Array2<f64>| {
            Array3::from_shape_fn((2, n, nxh), |(z, i, j)| iu * k[[i, j]] * spec[[z, i, j]])
        };

        let psix = self.backend.irfft2(&mul_k(&psispec, &self.wav.kx));
        let psiy = self.backend.irfft2(&mul_k(&psispec, &self.wav.ky));
        let pvx = self.backend.irfft2(&mul_k(pvspec, &self.wav.kx));
        let pvy = self.backend.irfft2(&mul_k(pvspec, &self.wav.ky));

        let jacobian = Array3::from_shape_fn((2, n, n), |(z, i, j)| {
            psix[[z, i, j]] * pvy[[z, i, j]] - psiy[[z, i, j]] * pvx[[z, i, j]]
        });
        let mut jacspec = self.backend.rfft2(&jacobian);
        if let Some(mask) = &self.dealias_mask {
            for z in 0..2 {
                for i in 0..n {
                    for j in 0..nxh {
                        jacspec[[z, i, j]] *= mask[[i, j]];
                    }
                }
            }
        }

        let mut dpvspec = Array3::from_shape_fn((2, n, nxh), |(z, i, j)| {
            (self.pvspec_eq[[z, i, j]] - pvspec[[z, i, j]]) / self.params.tdiab
                - jacspec[[z, i, j]]
        });

        if self.ekman {
            for i in 0..n {
                for j in 0..nxh {
                    let rk2 = self.params.r * self.wav.ksq[[i, j]];
                    dpvspec[[0, i, j]] += psispec[[0, i, j]] * rk2;
                    // no Ekman layer at the lid for the asymmetric jet
                    if self.params.symmetric {
                        dpvspec[[1, i, j]] -= psispec[[1, i, j]] * rk2;
                    }
                }
            }
        }

        dpvspec
    }

    /// One RK4 step, then the hyperdiffusion integrating factor.
    pub fn step(&mut self) {
        let n = self.params.nx;
        let nxh = self.wav.nxh;
        let dt = self.params.delta_t;

        let k1 = self.tendency(&self.pvspec);
        let s2 = Array3::from_shape_fn((2, n, nxh), |(z, i, j)| {
            self.pvspec[[z, i, j]] + k1[[z, i, j]] * (0.5 * dt)
        });
        let k2 = self.tendency(&s2);
        let s3 = Array3::from_shape_fn((2, n, nxh), |(z, i, j)| {
            self.pvspec[[z, i, j]] + k2[[z, i, j]] * (0.5 * dt)
        });
        let k3 = self.tendency(&s3);
        let s4 = Array3::from_shape_fn((2, n, nxh), |(z, i, j)| {
            self.pvspec[[z, i, j]] + k3[[z, i, j]] * dt
        });
        let k4 = self.tendency(&s4);

        for z in 0..2 {
            for i in 0..n {
                for j in 0..nxh {
                    let incr = (k1[[z, i, j]]
                        + k2[[z, i, j]] * 2.0
                        + k3[[z, i, j]] * 2.0
                        + k4[[z, i, j]])
                        * (dt / 6.0);
                    self.pvspec[[z, i, j]] =
                        (self.pvspec[[z, i, j]] + incr) * self.hyperdiff[[i, j]];
                }
            }
        }
        self.t += dt;
    }

    /// Advance n steps.
    pub fn advance(&mut self, n_steps: usize) {
        for _ in 0..n_steps {
            self.step();
        }
    }
}
