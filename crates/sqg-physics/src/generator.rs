// ─────────────────────────────────────────────────────────────────────
// SQG Turb Core — Generator
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Trajectory generation: seeded initial condition, spin-up, production
//! and pickup phases, and export to the persisted store.
//!
//! A run is one spin-up phase (intermediates discarded, final state
//! kept) followed by one production phase (every snapshot retained),
//! or a pickup continuation that resumes from the final snapshot of an
//! earlier store and skips spin-up. Long runs are chained by handing
//! each segment the previous segment's store as pickup input.

use ndarray::Array3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use std::f64::consts::PI;
use std::path::Path;
use std::sync::Arc;

use sqg_math::spectral::{SerialBackend, SpectralBackend, ThreadedBackend};
use sqg_types::config::{TurbConfig, TurbParams};
use sqg_types::constants::{INIT_NOISE_SCALE, INIT_VORTEX_AMP, INIT_VORTEX_EXP};
use sqg_types::error::{SqgError, SqgResult};
use sqg_types::state::Grid;

use crate::model::SqgModel;
use crate::store::{label_dataset, SqgDataset, TrajectoryStore};
use crate::trajectory::Trajectory;

/// Drives one SQG trajectory from configuration to persisted store.
pub struct TurbGenerator {
    params: TurbParams,
    grid: Grid,
    backend: Arc<dyn SpectralBackend>,
}

impl TurbGenerator {
    pub fn new(config: &TurbConfig) -> SqgResult<Self> {
        Self::from_params(config.resolve()?)
    }

    /// Build from an already-resolved parameter set. The spectral
    /// backend is selected here, once, from the `threads` option.
    pub fn from_params(params: TurbParams) -> SqgResult<Self> {
        let backend: Arc<dyn SpectralBackend> = if params.threads > 1 {
            Arc::new(ThreadedBackend::new(params.threads)?)
        } else {
            Arc::new(SerialBackend)
        };
        let grid = Grid::from_params(&params);
        Ok(TurbGenerator {
            params,
            grid,
            backend,
        })
    }

    pub fn params(&self) -> &TurbParams {
        &self.params
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Seeded initial condition with the run's configured seed.
    pub fn random_initial_condition(&self) -> SqgResult<Array3<f64>> {
        self.initial_condition(
            self.params.pv0_random_seed,
            INIT_NOISE_SCALE,
            INIT_VORTEX_AMP,
            INIT_VORTEX_EXP,
        )
    }

    /// Gaussian noise at every grid point per level, a localized
    /// vortex-like perturbation at the lid built from powers of sine
    /// profiles, then removal of the vertical-level mean so the net PV
    /// anomaly integrates to zero across levels.
    ///
    /// Deterministic: the same seed yields a bit-identical field.
    pub fn initial_condition(
        &self,
        seed: u64,
        noise_scale: f64,
        amp: f64,
        n_exp: i32,
    ) -> SqgResult<Array3<f64>> {
        let n = self.params.nx;
        let normal = Normal::new(0.0, noise_scale).map_err(|e| {
            SqgError::ConfigError(format!("invalid noise scale {noise_scale}: {e}"))
        })?;
        let mut rng = StdRng::seed_from_u64(seed);

        let mut pv = Array3::zeros((2, n, n));
        for lev in 0..2 {
            for i in 0..n {
                for j in 0..n {
                    pv[[lev, i, j]] = normal.sample(&mut rng);
                }
            }
        }

        // vortex perturbation on the unit 2*pi square, lid level only
        let step = 2.0 * PI / (n - 1) as f64;
        for i in 0..n {
            let y = i as f64 * step;
            for j in 0..n {
                let x = j as f64 * step;
                pv[[1, i, j]] +=
                    amp * (0.5 * x).sin().powi(2 * n_exp) * y.sin().powi(n_exp);
            }
        }

        // zero net anomaly across levels at every horizontal point
        for i in 0..n {
            for j in 0..n {
                let mean = 0.5 * (pv[[0, i, j]] + pv[[1, i, j]]);
                pv[[0, i, j]] -= mean;
                pv[[1, i, j]] -= mean;
            }
        }
        Ok(pv)
    }

    /// Build the spectral model from a gridded initial PV field.
    pub fn model_from(&self, pv0: &Array3<f64>) -> SqgResult<SqgModel> {
        SqgModel::new(pv0, &self.params, Arc::clone(&self.backend))
    }

    /// Resume from the final snapshot of a persisted store; spectral
    /// state is reconstructed by forward-transforming that snapshot.
    pub fn pickup_model(&self, store_dir: &Path) -> SqgResult<SqgModel> {
        let pv0 = TrajectoryStore::read_last_pv(store_dir)?;
        self.model_from(&pv0)
    }

    /// Run the spin-up phase: step for spinup_time, keep only the final
    /// state (held in the model), discard everything else.
    pub fn spinup(&self, model: &mut SqgModel) {
        model.advance(self.params.spinup_steps);
    }

    /// Production phase: step n_steps times, recording each post-step
    /// snapshot.
    pub fn generate(&self, model: &mut SqgModel, n_steps: usize) -> SqgResult<Trajectory> {
        let mut traj = Trajectory::with_capacity(self.params.nz, self.params.nx, n_steps);
        for _ in 0..n_steps {
            model.step();
            traj.record(model.pvspec())?;
        }
        Ok(traj)
    }

    /// Convert a recorded trajectory to the labeled gridded dataset.
    pub fn to_dataset(&self, traj: &Trajectory) -> SqgDataset {
        label_dataset(traj.to_grid(self.backend.as_ref()), &self.params, &self.grid)
    }

    /// Full pipeline: initial condition or pickup, spin-up (skipped on
    /// pickup), production, conversion to physical units, persistence.
    pub fn run(&self, out_store: &Path, pickup: Option<&Path>) -> SqgResult<()> {
        let mut model = match pickup {
            None => {
                let pv0 = self.random_initial_condition()?;
                let mut model = self.model_from(&pv0)?;
                self.spinup(&mut model);
                model
            }
            Some(path) => self.pickup_model(path)?,
        };

        let traj = self.generate(&mut model, self.params.trajectory_steps)?;
        let dataset = self.to_dataset(&traj);
        TrajectoryStore::save(out_store, &dataset, &self.params)
    }
}
