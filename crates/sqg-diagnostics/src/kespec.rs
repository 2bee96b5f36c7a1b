// ─────────────────────────────────────────────────────────────────────
// SQG Turb Core — KE Spectrum
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Isotropic 1D kinetic-energy spectra.
//!
//! A temperature (or PV) snapshot is converted to PV units, the
//! climatological jet is subtracted, the anomaly is inverted to a
//! streamfunction through the same closed-form machinery the model
//! steps with, and the 2D energy density |k| |psi|^2 is binned by
//! integer radial wavenumber. Binning is exhaustive and
//! non-overlapping: a cell lands in exactly one bin or is dropped past
//! the cutoff, and the fixed traversal order keeps the sums
//! bit-reproducible.

use ndarray::{Array1, Array2, Array3, Array4, Axis};
use std::f64::consts::PI;
use std::sync::Arc;

use sqg_math::spectral::{SerialBackend, SpectralBackend, TwoLevelInversion, Wavenumbers};
use sqg_physics::model::equilibrium_pv;
use sqg_types::config::TurbParams;
use sqg_types::error::{SqgError, SqgResult};

/// A binned isotropic spectrum.
#[derive(Debug, Clone)]
pub struct KeSpectrum {
    /// Radial wavenumber bins: integers, or rad/km when dimensional.
    pub wavenumbers: Array1<f64>,
    /// KE density per bin, averaged over the two levels.
    pub density: Array1<f64>,
    pub dimensional: bool,
}

/// Spectral analyzer bound to one run's parameter set.
pub struct SpectralAnalyzer {
    params: TurbParams,
    wav: Wavenumbers,
    inversion: TwoLevelInversion,
    backend: Arc<dyn SpectralBackend>,
    /// Nondimensional |k| per (ky, kx) cell.
    kmag: Array2<f64>,
    /// Jet PV on the grid, the assumed mean state.
    pvbar: Array3<f64>,
}

impl SpectralAnalyzer {
    pub fn new(params: &TurbParams) -> Self {
        Self::with_backend(params, Arc::new(SerialBackend))
    }

    pub fn with_backend(params: &TurbParams, backend: Arc<dyn SpectralBackend>) -> Self {
        let wav = Wavenumbers::new(params.nx, params.l);
        let inversion = TwoLevelInversion::new(&wav, params.nsq, params.h, params.f);
        let kmag = Array2::from_shape_fn((params.nx, wav.nxh), |(i, j)| {
            (wav.kx_int[j] * wav.kx_int[j] + wav.ky_int[i] * wav.ky_int[i]).sqrt()
        });
        let pvbar = equilibrium_pv(params);
        SpectralAnalyzer {
            params: params.clone(),
            wav,
            inversion,
            backend,
            kmag,
            pvbar,
        }
    }

    /// The closed-form jet PV profile the spectra are taken about.
    pub fn background_pv(&self) -> &Array3<f64> {
        &self.pvbar
    }

    /// Temperature deviation (K) to PV units.
    pub fn theta_to_pv(&self, theta: &Array3<f64>) -> Array3<f64> {
        theta.mapv(|v| v / self.params.scale_fact)
    }

    /// PV units to temperature deviation (K).
    pub fn pv_to_theta(&self, pv: &Array3<f64>) -> Array3<f64> {
        pv.mapv(|v| v * self.params.scale_fact)
    }

    /// Isotropic 1D KE spectrum of one (z, y, x) temperature snapshot.
    pub fn ke_spectrum_1d(
        &self,
        theta: &Array3<f64>,
        dimensional_wavenumbers: bool,
    ) -> SqgResult<KeSpectrum> {
        let density = self.bin_snapshot(theta)?;
        Ok(KeSpectrum {
            wavenumbers: self.wavenumber_bins(dimensional_wavenumbers),
            density,
            dimensional: dimensional_wavenumbers,
        })
    }

    /// As `ke_spectrum_1d`, for a snapshot already in PV units.
    pub fn ke_spectrum_1d_pv(
        &self,
        pv: &Array3<f64>,
        dimensional_wavenumbers: bool,
    ) -> SqgResult<KeSpectrum> {
        self.ke_spectrum_1d(&self.pv_to_theta(pv), dimensional_wavenumbers)
    }

    /// One spectrum per time index of a (time, z, y, x) series.
    pub fn ke_spectrum_series(
        &self,
        theta: &Array4<f64>,
        dimensional_wavenumbers: bool,
    ) -> SqgResult<(Array1<f64>, Array2<f64>)> {
        let ntime = theta.len_of(Axis(0));
        let kmax = self.wav.nxh;
        let mut out = Array2::zeros((ntime, kmax));
        for t in 0..ntime {
            let snapshot = theta.index_axis(Axis(0), t).to_owned();
            let density = self.bin_snapshot(&snapshot)?;
            out.row_mut(t).assign(&density);
        }
        Ok((self.wavenumber_bins(dimensional_wavenumbers), out))
    }

    fn wavenumber_bins(&self, dimensional: bool) -> Array1<f64> {
        let kmax = self.wav.nxh;
        if dimensional {
            // rad/km
            let scale = 2.0 * PI / self.params.l * 1.0e3;
            Array1::from_shape_fn(kmax, |k| k as f64 * scale)
        } else {
            Array1::from_shape_fn(kmax, |k| k as f64)
        }
    }

    fn bin_snapshot(&self, theta: &Array3<f64>) -> SqgResult<Array1<f64>> {
        let n = self.params.nx;
        if theta.dim() != (2, n, n) {
            return Err(SqgError::ShapeMismatch(format!(
                "expected snapshot (2, {n}, {n}), got {:?}",
                theta.dim()
            )));
        }

        // temperature -> PV, subtract the jet, transform the anomaly
        let anomaly = Array3::from_shape_fn((2, n, n), |(z, i, j)| {
            theta[[z, i, j]] / self.params.scale_fact - self.pvbar[[z, i, j]]
        });
        let pvspec = self.backend.rfft2(&anomaly);
        let psispec = self.inversion.invert(&pvspec);

        // spectral normalization for the unnormalized forward transform
        let norm = 1.0 / (n as f64 * 2.0_f64.sqrt());
        let norm_sq = norm * norm;

        let kmax = self.wav.nxh;
        let mut density = Array1::zeros(kmax);
        for i in 0..n {
            for j in 0..self.wav.nxh {
                let km = self.kmag[[i, j]];
                let bin = km.round() as usize;
                if bin >= kmax {
                    continue;
                }
                let level_mean = 0.5
                    * (psispec[[0, i, j]].norm_sqr() + psispec[[1, i, j]].norm_sqr());
                density[bin] += km * level_mean * norm_sq;
            }
        }
        Ok(density)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqg_types::config::TurbConfig;

    fn analyzer(nx: usize) -> SpectralAnalyzer {
        let params = TurbConfig {
            nx,
            ..Default::default()
        }
        .resolve()
        .unwrap();
        SpectralAnalyzer::new(&params)
    }

    /// Temperature field whose PV equals the jet plus one zonal mode.
    fn single_mode_theta(an: &SpectralAnalyzer, mode: usize, amp: f64) -> Array3<f64> {
        let n = an.params.nx;
        let pv = Array3::from_shape_fn((2, n, n), |(z, i, j)| {
            an.pvbar[[z, i, j]] + amp * (2.0 * PI * mode as f64 * j as f64 / n as f64).cos()
        });
        an.pv_to_theta(&pv)
    }

    #[test]
    fn test_background_state_has_no_anomaly_energy() {
        let an = analyzer(32);
        let theta = an.pv_to_theta(&an.background_pv().clone());
        let spec = an.ke_spectrum_1d(&theta, false).unwrap();
        // the anomaly is pure unit-conversion roundoff; any physical
        // signal sits many orders of magnitude above this
        let total: f64 = spec.density.sum();
        assert!(
            total.abs() < 1e-6,
            "the mean state itself must carry zero anomaly KE, got {total}"
        );
    }

    #[test]
    fn test_single_mode_lands_in_its_bin() {
        let an = analyzer(32);
        let theta = single_mode_theta(&an, 3, 10.0);
        let spec = an.ke_spectrum_1d(&theta, false).unwrap();
        assert_eq!(spec.density.len(), 17);
        let total: f64 = spec.density.sum();
        assert!(total > 0.0);
        assert!(
            spec.density[3] / total > 1.0 - 1e-10,
            "a kx=3 mode must land entirely in bin 3"
        );
    }

    #[test]
    fn test_binning_is_exhaustive_and_exclusive() {
        let an = analyzer(32);
        let n = 32;
        // generic smooth anomaly
        let pv = Array3::from_shape_fn((2, n, n), |(z, i, j)| {
            an.pvbar[[z, i, j]]
                + 5.0 * ((0.37 * i as f64).sin() + (0.61 * j as f64).cos() + z as f64)
        });
        let theta = an.pv_to_theta(&pv);
        let spec = an.ke_spectrum_1d(&theta, false).unwrap();

        // recompute the kept-cell total through the raw pipeline
        let anomaly = an.theta_to_pv(&theta) - an.background_pv();
        let pvspec = an.backend.rfft2(&anomaly);
        let psispec = an.inversion.invert(&pvspec);
        let norm_sq = 1.0 / (n as f64 * n as f64 * 2.0);
        let kmax = an.wav.nxh;
        let mut kept = 0.0;
        let mut dropped = 0.0;
        // reversed traversal: completeness must not depend on order
        for j in (0..an.wav.nxh).rev() {
            for i in (0..n).rev() {
                let km = an.kmag[[i, j]];
                let cell = km
                    * 0.5
                    * (psispec[[0, i, j]].norm_sqr() + psispec[[1, i, j]].norm_sqr())
                    * norm_sq;
                if (km.round() as usize) < kmax {
                    kept += cell;
                } else {
                    dropped += cell;
                }
            }
        }
        let total: f64 = spec.density.sum();
        assert!(
            (total - kept).abs() < 1e-9 * kept.max(1.0),
            "kept energy must match the binned total: {total} vs {kept}"
        );
        assert!(dropped > 0.0, "corner cells beyond the cutoff are dropped");
    }

    #[test]
    fn test_dimensional_wavenumber_scaling() {
        let an = analyzer(32);
        let theta = single_mode_theta(&an, 2, 1.0);
        let nd = an.ke_spectrum_1d(&theta, false).unwrap();
        let dim = an.ke_spectrum_1d(&theta, true).unwrap();

        assert_eq!(nd.wavenumbers[1], 1.0);
        let scale = 2.0 * PI / an.params.l * 1.0e3;
        assert!((dim.wavenumbers[1] - scale).abs() < 1e-15);
        // density is identical; only the axis changes
        for (a, b) in nd.density.iter().zip(dim.density.iter()) {
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_unit_conversions_invert() {
        let an = analyzer(32);
        let pv = Array3::from_shape_fn((2, 32, 32), |(z, i, j)| (z + i + j) as f64 * 0.1);
        let back = an.theta_to_pv(&an.pv_to_theta(&pv));
        for (a, b) in pv.iter().zip(back.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_series_one_spectrum_per_snapshot() {
        let an = analyzer(32);
        let snap = single_mode_theta(&an, 4, 2.0);
        let mut series = Array4::zeros((3, 2, 32, 32));
        for t in 0..3 {
            series
                .index_axis_mut(Axis(0), t)
                .assign(&snap.mapv(|v| v * (t + 1) as f64));
        }
        let (k1d, spectra) = an.ke_spectrum_series(&series, false).unwrap();
        assert_eq!(k1d.len(), 17);
        assert_eq!(spectra.dim(), (3, 17));
        // quadratic in amplitude: doubling theta quadruples the density
        assert!(
            (spectra[[1, 4]] / spectra[[0, 4]] - 4.0).abs() < 1e-6,
            "KE density must scale quadratically"
        );
    }

    #[test]
    fn test_snapshot_shape_checked() {
        let an = analyzer(32);
        let wrong = Array3::zeros((2, 16, 16));
        assert!(an.ke_spectrum_1d(&wrong, false).is_err());
    }

    #[test]
    fn test_spectrum_is_reproducible() {
        let an = analyzer(32);
        let theta = single_mode_theta(&an, 5, 3.0);
        let a = an.ke_spectrum_1d(&theta, false).unwrap();
        let b = an.ke_spectrum_1d(&theta, false).unwrap();
        for (x, y) in a.density.iter().zip(b.density.iter()) {
            assert_eq!(x.to_bits(), y.to_bits(), "binning must be bit-reproducible");
        }
    }
}
