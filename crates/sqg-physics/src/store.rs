// ─────────────────────────────────────────────────────────────────────
// SQG Turb Core — Trajectory Store
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Persisted trajectory store.
//!
//! A store is a directory:
//!
//! ```text
//! <dir>/attrs.json                 every run parameter, as scalars
//! <dir>/coords/{x,y,z,time}.npy    km for space, seconds for time
//! <dir>/q/chunk-00000.npy ...      PV, (time, z, y, x), time-chunked
//! <dir>/theta/chunk-00000.npy ...  temperature deviation, same layout
//! ```
//!
//! Array dtype on disk follows the configured precision (single -> f32).
//! Pickup reads only the final time index of `q`.

use ndarray::{Array1, Array3, Array4, Axis};
use ndarray_npy::{read_npy, write_npy};
use std::path::{Path, PathBuf};

use sqg_types::config::{Precision, TurbParams};
use sqg_types::error::{SqgError, SqgResult};

/// Kilometers per meter, for the stored spatial coordinates.
const KM_PER_M: f64 = 1.0e-3;

/// A gridded trajectory with labeled coordinates, ready to persist.
#[derive(Debug, Clone)]
pub struct SqgDataset {
    /// Potential vorticity, (time, z, y, x), units g/f.
    pub q: Array4<f64>,
    /// Potential temperature deviation, (time, z, y, x), units K.
    pub theta: Array4<f64>,
    /// Zonal coordinate (km).
    pub x: Array1<f64>,
    /// Meridional coordinate (km).
    pub y: Array1<f64>,
    /// Vertical coordinate (km).
    pub z: Array1<f64>,
    /// Elapsed seconds per snapshot.
    pub time: Array1<f64>,
}

/// Directory-backed trajectory persistence.
pub struct TrajectoryStore;

impl TrajectoryStore {
    /// Persist a dataset; chunked along time when `time_chunk` is set.
    pub fn save(dir: &Path, dataset: &SqgDataset, params: &TurbParams) -> SqgResult<()> {
        let ntime = dataset.q.len_of(Axis(0));
        if dataset.theta.len_of(Axis(0)) != ntime || dataset.time.len() != ntime {
            return Err(SqgError::ShapeMismatch(
                "q, theta and time must share the time axis".to_string(),
            ));
        }

        std::fs::create_dir_all(dir.join("coords"))?;
        std::fs::create_dir_all(dir.join("q"))?;
        std::fs::create_dir_all(dir.join("theta"))?;

        let attrs = serde_json::to_string_pretty(params)?;
        std::fs::write(dir.join("attrs.json"), attrs)?;

        write_f64(&dir.join("coords").join("x.npy"), &dataset.x)?;
        write_f64(&dir.join("coords").join("y.npy"), &dataset.y)?;
        write_f64(&dir.join("coords").join("z.npy"), &dataset.z)?;
        write_f64(&dir.join("coords").join("time.npy"), &dataset.time)?;

        let chunk = params.time_chunk.unwrap_or(ntime).max(1);
        let mut start = 0;
        let mut index = 0;
        while start < ntime {
            let stop = (start + chunk).min(ntime);
            let q_chunk = dataset.q.slice_axis(Axis(0), (start..stop).into());
            let th_chunk = dataset.theta.slice_axis(Axis(0), (start..stop).into());
            write_chunk(
                &chunk_path(dir, "q", index),
                &q_chunk.to_owned(),
                params.precision,
            )?;
            write_chunk(
                &chunk_path(dir, "theta", index),
                &th_chunk.to_owned(),
                params.precision,
            )?;
            start = stop;
            index += 1;
        }
        Ok(())
    }

    /// Read back the run parameters from a store.
    pub fn read_params(dir: &Path) -> SqgResult<TurbParams> {
        let contents = std::fs::read_to_string(dir.join("attrs.json"))?;
        let params: TurbParams = serde_json::from_str(&contents)?;
        Ok(params)
    }

    /// Read the full dataset back into memory.
    pub fn load(dir: &Path) -> SqgResult<(TurbParams, SqgDataset)> {
        let params = Self::read_params(dir)?;

        let x = read_f64(&dir.join("coords").join("x.npy"))?;
        let y = read_f64(&dir.join("coords").join("y.npy"))?;
        let z = read_f64(&dir.join("coords").join("z.npy"))?;
        let time = read_f64(&dir.join("coords").join("time.npy"))?;

        let q = read_variable(dir, "q", params.precision)?;
        let theta = read_variable(dir, "theta", params.precision)?;

        Ok((
            params,
            SqgDataset {
                q,
                theta,
                x,
                y,
                z,
                time,
            },
        ))
    }

    /// Final PV snapshot of a store, for pickup runs.
    pub fn read_last_pv(dir: &Path) -> SqgResult<Array3<f64>> {
        let params = Self::read_params(dir)?;
        let chunks = list_chunks(dir, "q")?;
        let last = chunks.last().ok_or_else(|| {
            SqgError::Store(format!("no q chunks found in {}", dir.display()))
        })?;
        let arr = read_chunk(last, params.precision)?;
        let ntime = arr.len_of(Axis(0));
        if ntime == 0 {
            return Err(SqgError::Store(format!(
                "empty final chunk {}",
                last.display()
            )));
        }
        Ok(arr.index_axis(Axis(0), ntime - 1).to_owned())
    }
}

/// Build a gridded dataset from raw arrays and the parameter set.
pub fn label_dataset(
    q: Array4<f64>,
    params: &TurbParams,
    grid: &sqg_types::state::Grid,
) -> SqgDataset {
    let ntime = q.len_of(Axis(0));
    let theta = q.mapv(|v| v * params.scale_fact);
    SqgDataset {
        theta,
        x: grid.x.mapv(|v| v * KM_PER_M),
        y: grid.y.mapv(|v| v * KM_PER_M),
        z: grid.z.mapv(|v| v * KM_PER_M),
        time: Array1::from_shape_fn(ntime, |i| i as f64 * params.delta_t),
        q,
    }
}

fn chunk_path(dir: &Path, var: &str, index: usize) -> PathBuf {
    dir.join(var).join(format!("chunk-{index:05}.npy"))
}

fn list_chunks(dir: &Path, var: &str) -> SqgResult<Vec<PathBuf>> {
    let mut chunks: Vec<PathBuf> = std::fs::read_dir(dir.join(var))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension().map(|e| e == "npy").unwrap_or(false)
                && p.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.starts_with("chunk-"))
                    .unwrap_or(false)
        })
        .collect();
    chunks.sort();
    Ok(chunks)
}

fn write_f64(path: &Path, arr: &Array1<f64>) -> SqgResult<()> {
    write_npy(path, arr).map_err(|e| SqgError::Store(format!("{}: {e}", path.display())))
}

fn read_f64(path: &Path) -> SqgResult<Array1<f64>> {
    read_npy(path).map_err(|e| SqgError::Store(format!("{}: {e}", path.display())))
}

fn write_chunk(path: &Path, arr: &Array4<f64>, precision: Precision) -> SqgResult<()> {
    match precision {
        Precision::Single => {
            let single = arr.mapv(|v| v as f32);
            write_npy(path, &single)
                .map_err(|e| SqgError::Store(format!("{}: {e}", path.display())))
        }
        Precision::Double => write_npy(path, arr)
            .map_err(|e| SqgError::Store(format!("{}: {e}", path.display()))),
    }
}

fn read_chunk(path: &Path, precision: Precision) -> SqgResult<Array4<f64>> {
    match precision {
        Precision::Single => {
            let single: Array4<f32> = read_npy(path)
                .map_err(|e| SqgError::Store(format!("{}: {e}", path.display())))?;
            Ok(single.mapv(f64::from))
        }
        Precision::Double => read_npy(path)
            .map_err(|e| SqgError::Store(format!("{}: {e}", path.display()))),
    }
}

fn read_variable(dir: &Path, var: &str, precision: Precision) -> SqgResult<Array4<f64>> {
    let chunks = list_chunks(dir, var)?;
    if chunks.is_empty() {
        return Err(SqgError::Store(format!(
            "no {var} chunks found in {}",
            dir.display()
        )));
    }
    let mut parts = Vec::with_capacity(chunks.len());
    for path in &chunks {
        parts.push(read_chunk(path, precision)?);
    }
    let views: Vec<_> = parts.iter().map(|a| a.view()).collect();
    ndarray::concatenate(Axis(0), &views)
        .map_err(|e| SqgError::Store(format!("concatenating {var} chunks: {e}")))
}
