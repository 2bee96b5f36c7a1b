// ─────────────────────────────────────────────────────────────────────
// SQG Turb Core — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Experiment configuration for the SQG turbulence generator.
//!
//! `TurbConfig` is the user-facing option set (JSON-loadable, every
//! recognized option enumerated with a default; unknown keys are a
//! construction-time error). `TurbConfig::resolve` validates it and
//! produces the immutable `TurbParams` carried by the model, the
//! generator and the diagnostics for the lifetime of a run.

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{SqgError, SqgResult};

/// Grid sizes with a canonical timestep / hyperdiffusion combo.
pub const SUPPORTED_NX: [usize; 7] = [32, 64, 96, 128, 192, 256, 512];

/// Canonical (delta_t, diff_efold) for a supported grid size, in seconds.
pub fn timespace(nx: usize) -> SqgResult<(f64, f64)> {
    match nx {
        32 => Ok((1800.0, 2.0 * SECONDS_PER_DAY)),
        64 => Ok((1200.0, SECONDS_PER_DAY)),
        96 => Ok((900.0, SECONDS_PER_DAY / 3.0)),
        128 => Ok((600.0, SECONDS_PER_DAY / 3.0)),
        192 => Ok((300.0, SECONDS_PER_DAY / 8.0)),
        256 => Ok((180.0, SECONDS_PER_DAY / 16.0)),
        512 => Ok((90.0, SECONDS_PER_DAY / 48.0)),
        _ => Err(SqgError::UnsupportedResolution {
            nx,
            supported: &SUPPORTED_NX,
        }),
    }
}

/// Storage precision of the persisted trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    Single,
    Double,
}

impl Precision {
    /// Bytes per stored element.
    pub fn nbytes(&self) -> usize {
        match self {
            Precision::Single => 4,
            Precision::Double => 8,
        }
    }
}

/// User-facing option set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct TurbConfig {
    /// Number of grid cells, x and y equal.
    #[serde(rename = "Nx")]
    pub nx: usize,
    /// Number of vertical levels (surface and lid).
    #[serde(rename = "Nz")]
    pub nz: usize,
    /// Time step in seconds; derived from Nx when unset.
    pub delta_t: Option<f64>,
    /// E-folding time for hyperdiffusion at the smallest resolved
    /// scale (s); derived from Nx when unset.
    pub diff_efold: Option<f64>,
    /// Order of hyperdiffusion.
    pub diff_order: i32,
    /// Dealias the nonlinear term with the 2/3 rule?
    pub dealias: bool,
    /// Ekman layer depth; surface damping is active only when > 0.
    pub dek: f64,
    /// Brunt-Vaisala frequency squared (1/s^2).
    pub nsq: f64,
    /// Coriolis parameter (1/s).
    pub f: f64,
    /// Gravity (m/s^2).
    pub g: f64,
    /// Reference potential temperature (K).
    pub theta0: f64,
    /// Lid height (m).
    #[serde(rename = "H")]
    pub h: f64,
    /// Jet speed (m/s).
    #[serde(rename = "U")]
    pub u: f64,
    /// Timescale for linear thermal relaxation to equilibrium (s).
    pub tdiab: f64,
    /// If false, asymmetric equilibrium jet with zero wind at the surface.
    pub symmetric: bool,
    /// Spin-up duration (s); intermediate states are discarded.
    pub spinup_time: f64,
    /// Production duration (s); every snapshot is retained.
    pub trajectory_time: f64,
    /// Seed for the random initial PV field.
    pub pv0_random_seed: u64,
    /// Storage precision of the persisted trajectory.
    pub precision: Precision,
    /// Worker threads for the spectral backend; 1 selects the serial path.
    pub threads: usize,
    /// Snapshots per store chunk; one chunk for the whole run when unset.
    pub time_chunk: Option<usize>,
    /// Model time at the start of the run (s).
    pub tstart: f64,
}

impl Default for TurbConfig {
    fn default() -> Self {
        TurbConfig {
            nx: 64,
            nz: 2,
            delta_t: None,
            diff_efold: None,
            diff_order: DIFF_ORDER,
            dealias: true,
            dek: 0.0,
            nsq: BRUNT_VAISALA_NSQ,
            f: CORIOLIS_F,
            g: GRAVITY,
            theta0: THETA0,
            h: LID_HEIGHT,
            u: JET_SPEED,
            tdiab: TDIAB,
            symmetric: true,
            spinup_time: SPINUP_TIME,
            trajectory_time: TRAJECTORY_TIME,
            pv0_random_seed: 0,
            precision: Precision::Single,
            threads: 1,
            time_chunk: None,
            tstart: 0.0,
        }
    }
}

impl TurbConfig {
    /// Load from a JSON experiment file.
    pub fn from_file(path: &str) -> SqgResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Validate and derive the immutable parameter set for a run.
    ///
    /// Fails fast on an unsupported grid size, a vertical level count
    /// other than 2, or a degenerate thread/timestep setting.
    pub fn resolve(&self) -> SqgResult<TurbParams> {
        let (dt_canon, efold_canon) = timespace(self.nx)?;
        if self.nz != 2 {
            return Err(SqgError::ConfigError(format!(
                "Nz must be 2 (surface and lid), got {}",
                self.nz
            )));
        }
        if self.threads == 0 {
            return Err(SqgError::ConfigError(
                "threads must be >= 1".to_string(),
            ));
        }
        let delta_t = self.delta_t.unwrap_or(dt_canon);
        let diff_efold = self.diff_efold.unwrap_or(efold_canon);
        if delta_t <= 0.0 || diff_efold <= 0.0 {
            return Err(SqgError::ConfigError(format!(
                "delta_t and diff_efold must be positive, got {delta_t} and {diff_efold}"
            )));
        }
        if let Some(chunk) = self.time_chunk {
            if chunk == 0 {
                return Err(SqgError::ConfigError(
                    "time_chunk must be >= 1 when set".to_string(),
                ));
            }
        }

        let r = self.dek * self.nsq / self.f;
        let lr = self.nsq.sqrt() * self.h / self.f;
        let l = DOMAIN_LENGTHS_PER_LR * lr;
        let scale_fact = self.f * self.theta0 / self.g;

        Ok(TurbParams {
            nx: self.nx,
            nz: self.nz,
            delta_t,
            diff_efold,
            diff_order: self.diff_order,
            dealias: self.dealias,
            dek: self.dek,
            r,
            nsq: self.nsq,
            f: self.f,
            g: self.g,
            theta0: self.theta0,
            h: self.h,
            u: self.u,
            tdiab: self.tdiab,
            symmetric: self.symmetric,
            lr,
            l,
            scale_fact,
            spinup_time: self.spinup_time,
            trajectory_time: self.trajectory_time,
            spinup_steps: (self.spinup_time / delta_t) as usize,
            trajectory_steps: (self.trajectory_time / delta_t) as usize,
            pv0_random_seed: self.pv0_random_seed,
            precision: self.precision,
            threads: self.threads,
            time_chunk: self.time_chunk,
            tstart: self.tstart,
        })
    }
}

/// Resolved, immutable parameter set for one run.
///
/// Constructed once by `TurbConfig::resolve` and never mutated; the
/// full struct is persisted as the store's global attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurbParams {
    #[serde(rename = "Nx")]
    pub nx: usize,
    #[serde(rename = "Nz")]
    pub nz: usize,
    pub delta_t: f64,
    pub diff_efold: f64,
    pub diff_order: i32,
    pub dealias: bool,
    pub dek: f64,
    /// Ekman damping coefficient, dek * nsq / f.
    pub r: f64,
    pub nsq: f64,
    pub f: f64,
    pub g: f64,
    pub theta0: f64,
    #[serde(rename = "H")]
    pub h: f64,
    #[serde(rename = "U")]
    pub u: f64,
    pub tdiab: f64,
    pub symmetric: bool,
    /// Rossby radius, sqrt(nsq) * H / f (m).
    #[serde(rename = "Lr")]
    pub lr: f64,
    /// Domain length, 20 Lr (m).
    #[serde(rename = "L")]
    pub l: f64,
    /// PV -> potential temperature scale factor, f * theta0 / g.
    pub scale_fact: f64,
    pub spinup_time: f64,
    pub trajectory_time: f64,
    pub spinup_steps: usize,
    pub trajectory_steps: usize,
    pub pv0_random_seed: u64,
    pub precision: Precision,
    pub threads: usize,
    pub time_chunk: Option<usize>,
    pub tstart: f64,
}

impl TurbParams {
    /// In-memory footprint of the gridded spin-up phase, in bytes.
    pub fn nbytes_spinup(&self) -> usize {
        self.spinup_steps * self.nx * self.nx * self.nz * self.precision.nbytes()
    }

    /// In-memory footprint of the gridded production phase, in bytes.
    pub fn nbytes_trajectory(&self) -> usize {
        self.trajectory_steps * self.nx * self.nx * self.nz * self.precision.nbytes()
    }
}
