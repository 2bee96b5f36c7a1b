// ─────────────────────────────────────────────────────────────────────
// SQG Turb Core — Trajectory
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Append-only spectral trajectory buffer.
//!
//! Snapshots live as flattened spectral columns of a (ncoeff, ntime)
//! array, ncoeff = nz * nx * (nx/2+1); the buffer is pre-sized because
//! the step count is known up front. Conversion to the gridded
//! (time, z, y, x) representation happens once, after generation.

use ndarray::{Array2, Array3, Array4};
use num_complex::Complex64;

use sqg_math::spectral::SpectralBackend;
use sqg_types::error::{SqgError, SqgResult};

#[derive(Debug, Clone)]
pub struct Trajectory {
    /// Flattened spectral snapshots, (ncoeff, ntime).
    values: Array2<Complex64>,
    nx: usize,
    nz: usize,
    recorded: usize,
}

impl Trajectory {
    /// Pre-size a buffer for n_steps snapshots.
    pub fn with_capacity(nz: usize, nx: usize, n_steps: usize) -> Self {
        let ncoeff = nz * nx * (nx / 2 + 1);
        Trajectory {
            values: Array2::zeros((ncoeff, n_steps)),
            nx,
            nz,
            recorded: 0,
        }
    }

    /// Number of recorded snapshots.
    pub fn len(&self) -> usize {
        self.recorded
    }

    pub fn is_empty(&self) -> bool {
        self.recorded == 0
    }

    /// Append one spectral snapshot.
    pub fn record(&mut self, pvspec: &Array3<Complex64>) -> SqgResult<()> {
        if self.recorded >= self.values.ncols() {
            return Err(SqgError::ShapeMismatch(format!(
                "trajectory buffer full at {} snapshots",
                self.values.ncols()
            )));
        }
        let expected = (self.nz, self.nx, self.nx / 2 + 1);
        if pvspec.dim() != expected {
            return Err(SqgError::ShapeMismatch(format!(
                "expected snapshot {expected:?}, got {:?}",
                pvspec.dim()
            )));
        }
        for (row, &v) in pvspec.iter().enumerate() {
            self.values[[row, self.recorded]] = v;
        }
        self.recorded += 1;
        Ok(())
    }

    /// Last recorded snapshot, unflattened.
    pub fn last_state(&self) -> SqgResult<Array3<Complex64>> {
        if self.recorded == 0 {
            return Err(SqgError::ShapeMismatch(
                "trajectory holds no snapshots".to_string(),
            ));
        }
        let nxh = self.nx / 2 + 1;
        let col = self.values.column(self.recorded - 1);
        let mut out = Array3::zeros((self.nz, self.nx, nxh));
        for (row, v) in out.iter_mut().enumerate() {
            *v = col[row];
        }
        Ok(out)
    }

    /// Inverse-transform every snapshot to the gridded
    /// (time, z, y, x) representation.
    pub fn to_grid(&self, backend: &dyn SpectralBackend) -> Array4<f64> {
        let nxh = self.nx / 2 + 1;
        let mut out = Array4::zeros((self.recorded, self.nz, self.nx, self.nx));
        for t in 0..self.recorded {
            let col = self.values.column(t);
            let mut spec = Array3::zeros((self.nz, self.nx, nxh));
            for (row, v) in spec.iter_mut().enumerate() {
                *v = col[row];
            }
            let grid = backend.irfft2(&spec);
            out.index_axis_mut(ndarray::Axis(0), t).assign(&grid);
        }
        out
    }
}
