// ─────────────────────────────────────────────────────────────────────
// SQG Turb Core — Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
/// Seconds per model day.
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Default Coriolis parameter (1/s).
pub const CORIOLIS_F: f64 = 1.0e-4;

/// Default Brunt-Vaisala frequency squared (1/s^2).
pub const BRUNT_VAISALA_NSQ: f64 = 1.0e-4;

/// Gravity (m/s^2).
pub const GRAVITY: f64 = 9.8;

/// Default reference potential temperature (K).
pub const THETA0: f64 = 300.0;

/// Default lid height (m).
pub const LID_HEIGHT: f64 = 1.0e4;

/// Default jet speed (m/s).
pub const JET_SPEED: f64 = 30.0;

/// Default thermal relaxation timescale: 10 days (s).
pub const TDIAB: f64 = 10.0 * SECONDS_PER_DAY;

/// Default hyperdiffusion order.
pub const DIFF_ORDER: i32 = 8;

/// Default spin-up duration: 360 days (s).
pub const SPINUP_TIME: f64 = 360.0 * SECONDS_PER_DAY;

/// Default production duration: 720 days (s).
pub const TRAJECTORY_TIME: f64 = 720.0 * SECONDS_PER_DAY;

/// Gaussian noise scale for the random initial PV field.
pub const INIT_NOISE_SCALE: f64 = 100.0;

/// Amplitude of the localized lid-level vortex perturbation.
pub const INIT_VORTEX_AMP: f64 = 2000.0;

/// Exponent shaping the lid-level vortex perturbation.
pub const INIT_VORTEX_EXP: i32 = 20;

/// Rossby radii per domain length: L = 20 Lr.
pub const DOMAIN_LENGTHS_PER_LR: f64 = 20.0;
