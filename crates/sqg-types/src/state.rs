// ─────────────────────────────────────────────────────────────────────
// SQG Turb Core — State
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use ndarray::Array1;

use crate::config::TurbParams;

/// Doubly-periodic grid geometry with precomputed coordinates.
///
/// Output coordinates span [0, L] inclusive (linspace convention); the
/// jet profile uses the endpoint-exclusive `y_jet` spacing so that the
/// relaxation target is exactly periodic.
#[derive(Debug, Clone)]
pub struct Grid {
    pub nx: usize,
    pub nz: usize,
    /// Domain length (m).
    pub l: f64,
    /// Lid height (m).
    pub h: f64,
    /// Zonal coordinate (m), [nx].
    pub x: Array1<f64>,
    /// Meridional coordinate (m), [nx].
    pub y: Array1<f64>,
    /// Vertical coordinate (m), [nz]: surface and lid.
    pub z: Array1<f64>,
}

impl Grid {
    pub fn new(nx: usize, nz: usize, l: f64, h: f64) -> Self {
        Grid {
            nx,
            nz,
            l,
            h,
            x: Array1::linspace(0.0, l, nx),
            y: Array1::linspace(0.0, l, nx),
            z: Array1::linspace(0.0, h, nz),
        }
    }

    pub fn from_params(params: &TurbParams) -> Self {
        Grid::new(params.nx, params.nz, params.l, params.h)
    }

    /// Meridional coordinate with grid spacing L/nx, excluding the
    /// endpoint: y_j = j L / nx.
    pub fn y_jet(&self) -> Array1<f64> {
        let step = self.l / self.nx as f64;
        Array1::from_shape_fn(self.nx, |j| j as f64 * step)
    }
}
